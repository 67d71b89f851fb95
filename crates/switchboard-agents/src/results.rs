//! Results specialist
//!
//! Answers final-score and series questions by searching the web and
//! shaping the hits into a short reply. Serves the streaming route with
//! real frames: a working status while the search runs, then the reply
//! in chunks.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use switchboard_a2a::{
    AgentCapabilities, AgentCard, AgentSkill, StreamEvent, TaskExecutor, TaskStatus,
};
use tokio::sync::mpsc;
use tracing::warn;

use crate::search::SearchClient;

pub const RESULTS_AGENT_NAME: &str = "sports-results";

const MAX_SEARCH_RESULTS: usize = 5;
const DELTA_CHUNK_CHARS: usize = 200;

pub struct ResultsAgent {
    search: SearchClient,
}

impl ResultsAgent {
    pub fn new(search: SearchClient) -> Self {
        Self { search }
    }

    /// The card this agent publishes at its well-known path.
    pub fn card(base_url: &str) -> AgentCard {
        AgentCard {
            name: RESULTS_AGENT_NAME.to_string(),
            description: "Looks up final scores, box scores and series results for recent games"
                .to_string(),
            url: base_url.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: AgentCapabilities { streaming: true },
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: vec![AgentSkill {
                id: "sports-results".to_string(),
                name: "Sports Results".to_string(),
                description: "Final scores and series results from recent games".to_string(),
                tags: vec![
                    "mlb".to_string(),
                    "nba".to_string(),
                    "nfl".to_string(),
                    "nhl".to_string(),
                    "scores".to_string(),
                ],
                examples: vec![
                    "Show the score of the Pirates game last night".to_string(),
                    "Who won the Lakers game on Friday?".to_string(),
                    "Did the Penguins win their last game?".to_string(),
                ],
            }],
        }
    }
}

async fn lookup(search: &SearchClient, message: &str) -> Result<String> {
    let query = build_query(message);
    let response = search.search(&query, MAX_SEARCH_RESULTS).await?;
    Ok(SearchClient::format_reply(&response))
}

/// Steer the search toward result pages instead of previews
fn build_query(message: &str) -> String {
    format!("{} final score result", message.trim())
}

/// Split a reply into delta-sized pieces on whitespace, so the chunks
/// concatenate back to the exact original text.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_inclusive(char::is_whitespace) {
        if !current.is_empty() && current.len() + word.len() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl TaskExecutor for ResultsAgent {
    async fn execute(&self, message: &str, _session_id: &str) -> Result<String> {
        lookup(&self.search, message).await
    }

    async fn stream(&self, message: &str, _session_id: &str) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(16);
        let search = self.search.clone();
        let message = message.to_string();

        tokio::spawn(async move {
            let _ = tx
                .send(StreamEvent::Status {
                    status: TaskStatus::Working,
                    message: Some("Searching for results".to_string()),
                })
                .await;

            match lookup(&search, &message).await {
                Ok(reply) => {
                    for chunk in chunk_text(&reply, DELTA_CHUNK_CHARS) {
                        if tx.send(StreamEvent::Delta { text: chunk }).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx
                        .send(StreamEvent::Done {
                            status: TaskStatus::Completed,
                        })
                        .await;
                }
                Err(e) => {
                    warn!("Results lookup failed: {:#}", e);
                    let _ = tx
                        .send(StreamEvent::Status {
                            status: TaskStatus::Failed,
                            message: Some(format!("{e:#}")),
                        })
                        .await;
                    let _ = tx
                        .send(StreamEvent::Done {
                            status: TaskStatus::Failed,
                        })
                        .await;
                }
            }
        });

        rx
    }
}

/// Convenience for serving: the agent behind an `Arc` executor.
pub fn executor(search: SearchClient) -> Arc<dyn TaskExecutor> {
    Arc::new(ResultsAgent::new(search))
}
