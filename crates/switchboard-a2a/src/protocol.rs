//! A2A (Agent-to-Agent) protocol types
//!
//! Wire shapes for agent discovery and task exchange: the capability card
//! served at the well-known path, task parameters and responses, and the
//! event frames of a streamed task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Discovery path where every agent serves its card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";
/// Single round-trip task endpoint
pub const TASKS_PATH: &str = "/a2a/tasks";
/// Streaming task endpoint (SSE)
pub const TASKS_STREAM_PATH: &str = "/a2a/tasks/stream";

/// Agent Card — advertises identity and skills at the discovery path.
/// Immutable once fetched; the registry never re-reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default = "default_modes")]
    pub default_input_modes: Vec<String>,
    #[serde(default = "default_modes")]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

/// Optional protocol features an agent supports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
}

/// One advertised skill on an agent card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

fn default_modes() -> Vec<String> {
    vec!["text".to_string()]
}

impl AgentCard {
    /// Whether any skill carries the given tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.skills
            .iter()
            .flat_map(|s| s.tags.iter())
            .any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Parameters for a task request. The caller generates the task id; the
/// session id groups the tasks of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSendParams {
    pub id: String,
    pub session_id: String,
    pub message: String,
}

impl TaskSendParams {
    /// Build params with a fresh task id
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// Final response of a single round-trip task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub session_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Whether this status ends the task for the current turn
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InputRequired | Self::Completed | Self::Failed | Self::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Working => write!(f, "working"),
            Self::InputRequired => write!(f, "input_required"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One frame of a streamed task reply.
///
/// Frames are decoded leniently, exactly once, at the transport boundary:
/// a frame whose kind is unrecognized or whose required fields are missing
/// becomes [`StreamEvent::Unknown`], which consumers skip. Newer agents can
/// add frame kinds without breaking older routers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text to append to the reply
    Delta { text: String },
    /// Progress information; never part of the reply text
    Status {
        status: TaskStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Final frame of the task
    Done { status: TaskStatus },
    /// Unrecognized frame, skipped by consumers
    Unknown,
}

impl StreamEvent {
    /// Decode a frame from raw SSE payload text
    pub fn from_json(data: &str) -> StreamEvent {
        match serde_json::from_str::<Value>(data) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                debug!("Undecodable stream frame: {}", e);
                StreamEvent::Unknown
            }
        }
    }

    /// Decode a frame from a JSON value by its `kind` tag
    pub fn from_value(value: &Value) -> StreamEvent {
        match value.get("kind").and_then(Value::as_str) {
            Some("delta") => match value.get("text").and_then(Value::as_str) {
                Some(text) => StreamEvent::Delta {
                    text: text.to_string(),
                },
                None => {
                    debug!("Delta frame without text field");
                    StreamEvent::Unknown
                }
            },
            Some("status") => StreamEvent::Status {
                status: frame_status(value, TaskStatus::Working),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            Some("done") => StreamEvent::Done {
                status: frame_status(value, TaskStatus::Completed),
            },
            other => {
                debug!(kind = ?other, "Unrecognized stream frame kind");
                StreamEvent::Unknown
            }
        }
    }
}

fn frame_status(value: &Value, fallback: TaskStatus) -> TaskStatus {
    value
        .get("status")
        .and_then(|s| serde_json::from_value(s.clone()).ok())
        .unwrap_or(fallback)
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> AgentCard {
        AgentCard {
            name: "sports-results".to_string(),
            description: "Looks up final scores for recent games".to_string(),
            url: "http://localhost:10001".to_string(),
            version: "0.1.0".to_string(),
            capabilities: AgentCapabilities { streaming: true },
            default_input_modes: default_modes(),
            default_output_modes: default_modes(),
            skills: vec![AgentSkill {
                id: "sports_results".to_string(),
                name: "Sports Results".to_string(),
                description: "Final scores and series results".to_string(),
                tags: vec!["mlb".to_string(), "nba".to_string()],
                examples: vec!["Show the score of the Pirates game last night".to_string()],
            }],
        }
    }

    #[test]
    fn test_agent_card_serialization() {
        let card = sample_card();
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "sports-results");
        assert_eq!(json["capabilities"]["streaming"], true);
        assert_eq!(json["skills"][0]["tags"][0], "mlb");
        assert_eq!(json["default_input_modes"][0], "text");
    }

    #[test]
    fn test_agent_card_minimal_deserialization() {
        let json = r#"{
            "name": "bare",
            "description": "minimal card",
            "url": "http://localhost:9999"
        }"#;
        let card: AgentCard = serde_json::from_str(json).unwrap();
        assert!(!card.capabilities.streaming);
        assert_eq!(card.default_input_modes, vec!["text"]);
        assert!(card.skills.is_empty());
    }

    #[test]
    fn test_has_tag_case_insensitive() {
        let card = sample_card();
        assert!(card.has_tag("mlb"));
        assert!(card.has_tag("MLB"));
        assert!(!card.has_tag("nascar"));
    }

    #[test]
    fn test_task_status_display_matches_wire() {
        assert_eq!(TaskStatus::Working.to_string(), "working");
        assert_eq!(TaskStatus::InputRequired.to_string(), "input_required");
        let wire = serde_json::to_string(&TaskStatus::InputRequired).unwrap();
        assert_eq!(wire, "\"input_required\"");
    }

    #[test]
    fn test_task_status_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::InputRequired.is_terminal());
        assert!(!TaskStatus::Working.is_terminal());
        assert!(!TaskStatus::Submitted.is_terminal());
    }

    #[test]
    fn test_task_params_fresh_ids() {
        let a = TaskSendParams::new("scores please", "session-1");
        let b = TaskSendParams::new("scores please", "session-1");
        assert_ne!(a.id, b.id);
        assert_eq!(a.session_id, "session-1");
    }

    #[test]
    fn test_task_response_serialization() {
        let resp = TaskResponse {
            id: "abc-123".to_string(),
            session_id: "session-1".to_string(),
            status: TaskStatus::Completed,
            result: Some("Pirates 5, Reds 3".to_string()),
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["result"], "Pirates 5, Reds 3");
    }

    #[test]
    fn test_stream_event_delta_roundtrip() {
        let event = StreamEvent::Delta {
            text: "Hel".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "delta");
        assert_eq!(StreamEvent::from_value(&json), event);
    }

    #[test]
    fn test_stream_event_status_roundtrip() {
        let event = StreamEvent::Status {
            status: TaskStatus::Working,
            message: Some("Searching the web".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(StreamEvent::from_value(&json), event);
    }

    #[test]
    fn test_stream_event_done_roundtrip() {
        let event = StreamEvent::Done {
            status: TaskStatus::Completed,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(StreamEvent::from_value(&json), event);
    }

    #[test]
    fn test_stream_event_unknown_kind() {
        let event = StreamEvent::from_json(r#"{"kind":"artifact","data":[1,2,3]}"#);
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn test_stream_event_delta_missing_text() {
        let event = StreamEvent::from_json(r#"{"kind":"delta"}"#);
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn test_stream_event_undecodable() {
        assert_eq!(StreamEvent::from_json("not json"), StreamEvent::Unknown);
        assert_eq!(StreamEvent::from_json(""), StreamEvent::Unknown);
    }

    #[test]
    fn test_stream_event_lenient_status_defaults() {
        // A done frame without a status still terminates cleanly
        let done = StreamEvent::from_json(r#"{"kind":"done"}"#);
        assert_eq!(
            done,
            StreamEvent::Done {
                status: TaskStatus::Completed
            }
        );

        let status = StreamEvent::from_json(r#"{"kind":"status"}"#);
        assert_eq!(
            status,
            StreamEvent::Status {
                status: TaskStatus::Working,
                message: None
            }
        );
    }
}
