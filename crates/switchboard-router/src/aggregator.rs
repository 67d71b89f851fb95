//! Stream aggregation
//!
//! Folds the frames of one remote task into a single reply. The folding
//! rules are deliberately small: text deltas append in arrival order,
//! status frames are logged and never merged into the reply, a done
//! frame ends consumption even when more frames sit in the channel, and
//! unrecognized frames are skipped. A channel that closes without a
//! done frame counts as an implicit termination.

use std::time::Duration;

use switchboard_a2a::{StreamEvent, TaskStatus};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use crate::error::RouterError;

/// Fixed reply text when a task terminates without contributing any
/// text. Callers can rely on the exact string.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received.";

/// The folded outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedResponse {
    /// Accumulated reply text. Never empty: the placeholder stands in
    /// when nothing arrived.
    pub text: String,
    /// Whether a terminal frame arrived. False when the stream closed
    /// without one.
    pub complete: bool,
    /// Whether the agent finished by asking for more user input.
    pub requires_input: bool,
}

impl AggregatedResponse {
    /// A finished response carrying the given text.
    pub fn complete_text(text: impl Into<String>) -> Self {
        Self {
            text: non_empty_or_placeholder(text.into()),
            complete: true,
            requires_input: false,
        }
    }
}

fn non_empty_or_placeholder(text: String) -> String {
    if text.trim().is_empty() {
        NO_RESPONSE_PLACEHOLDER.to_string()
    } else {
        text
    }
}

/// Fold one task's frames into an [`AggregatedResponse`].
///
/// Consumption stops at the first done frame or when the channel
/// closes. Silence longer than `idle_timeout` between frames is a
/// [`RouterError::RemoteTimeout`]; any partial buffer is discarded with
/// the error.
pub async fn aggregate(
    rx: &mut mpsc::Receiver<StreamEvent>,
    idle_timeout: Duration,
    agent: &str,
) -> Result<AggregatedResponse, RouterError> {
    let mut text = String::new();
    let mut complete = false;
    let mut requires_input = false;

    loop {
        let event = match timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                return Err(RouterError::RemoteTimeout {
                    agent: agent.to_string(),
                    after: idle_timeout,
                });
            }
        };

        match event {
            StreamEvent::Delta { text: chunk } => text.push_str(&chunk),
            StreamEvent::Status { status, message } => {
                debug!(
                    agent,
                    status = %status,
                    message = message.as_deref().unwrap_or(""),
                    "Task status update"
                );
            }
            StreamEvent::Done { status } => {
                complete = true;
                requires_input = status == TaskStatus::InputRequired;
                break;
            }
            StreamEvent::Unknown => {
                debug!(agent, "Skipping unrecognized stream frame");
            }
        }
    }

    Ok(AggregatedResponse {
        text: non_empty_or_placeholder(text),
        complete,
        requires_input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(1);

    async fn fold(events: Vec<StreamEvent>) -> AggregatedResponse {
        let (tx, mut rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);
        aggregate(&mut rx, IDLE, "test-agent").await.unwrap()
    }

    #[tokio::test]
    async fn test_deltas_append_in_order() {
        let response = fold(vec![
            StreamEvent::Delta {
                text: "Hel".to_string(),
            },
            StreamEvent::Delta {
                text: "lo".to_string(),
            },
            StreamEvent::Done {
                status: TaskStatus::Completed,
            },
        ])
        .await;
        assert_eq!(response.text, "Hello");
        assert!(response.complete);
        assert!(!response.requires_input);
    }

    #[tokio::test]
    async fn test_status_frames_never_reach_the_reply() {
        let response = fold(vec![
            StreamEvent::Status {
                status: TaskStatus::Working,
                message: Some("Looking up scores".to_string()),
            },
            StreamEvent::Delta {
                text: "Pirates 5, Reds 3".to_string(),
            },
            StreamEvent::Done {
                status: TaskStatus::Completed,
            },
        ])
        .await;
        assert_eq!(response.text, "Pirates 5, Reds 3");
    }

    #[tokio::test]
    async fn test_unknown_frames_are_skipped() {
        let response = fold(vec![
            StreamEvent::Unknown,
            StreamEvent::Delta {
                text: "ok".to_string(),
            },
            StreamEvent::Unknown,
            StreamEvent::Done {
                status: TaskStatus::Completed,
            },
        ])
        .await;
        assert_eq!(response.text, "ok");
        assert!(response.complete);
    }

    #[tokio::test]
    async fn test_done_stops_consumption_with_frames_still_queued() {
        let response = fold(vec![
            StreamEvent::Delta {
                text: "Hello".to_string(),
            },
            StreamEvent::Done {
                status: TaskStatus::Completed,
            },
            StreamEvent::Delta {
                text: " MORE".to_string(),
            },
        ])
        .await;
        assert_eq!(response.text, "Hello");
        assert!(response.complete);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_placeholder() {
        let response = fold(vec![StreamEvent::Done {
            status: TaskStatus::Completed,
        }])
        .await;
        assert_eq!(response.text, NO_RESPONSE_PLACEHOLDER);
        assert!(response.complete);
    }

    #[tokio::test]
    async fn test_channel_close_is_implicit_termination() {
        let response = fold(vec![StreamEvent::Delta {
            text: "partial".to_string(),
        }])
        .await;
        assert_eq!(response.text, "partial");
        assert!(!response.complete);
    }

    #[tokio::test]
    async fn test_close_with_no_frames_yields_placeholder_incomplete() {
        let response = fold(vec![]).await;
        assert_eq!(response.text, NO_RESPONSE_PLACEHOLDER);
        assert!(!response.complete);
    }

    #[tokio::test]
    async fn test_input_required_sets_flag() {
        let response = fold(vec![
            StreamEvent::Delta {
                text: "Which team?".to_string(),
            },
            StreamEvent::Done {
                status: TaskStatus::InputRequired,
            },
        ])
        .await;
        assert!(response.complete);
        assert!(response.requires_input);
    }

    #[tokio::test]
    async fn test_idle_timeout_discards_partial_buffer() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta {
            text: "partial".to_string(),
        })
        .await
        .unwrap();
        // Keep the sender alive so the channel stays open and silent.
        let result = aggregate(&mut rx, Duration::from_millis(50), "slow-agent").await;
        match result {
            Err(RouterError::RemoteTimeout { agent, after }) => {
                assert_eq!(agent, "slow-agent");
                assert_eq!(after, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        drop(tx);
    }

    #[tokio::test]
    async fn test_complete_text_substitutes_placeholder_for_blank() {
        let response = AggregatedResponse::complete_text("   ");
        assert_eq!(response.text, NO_RESPONSE_PLACEHOLDER);
        assert!(response.complete);

        let response = AggregatedResponse::complete_text("Final: 3-2");
        assert_eq!(response.text, "Final: 3-2");
    }
}
