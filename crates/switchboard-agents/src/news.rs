//! News specialist
//!
//! Pulls headlines from the league feed over MCP. Replies in one round
//! trip; the card advertises no streaming, so callers use the batch
//! route (the default stream wrapper still serves SSE clients).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use switchboard_a2a::{AgentCapabilities, AgentCard, AgentSkill, TaskExecutor};
use tracing::debug;

use crate::feed::FeedClient;

pub const NEWS_AGENT_NAME: &str = "sports-news";

/// The feed tool that returns headlines for one league
const NEWS_TOOL: &str = "get_sport_news";

/// Leagues the feed covers, in the order they are tried
const LEAGUES: &[&str] = &["mlb", "nba", "nascar", "golf", "college-football"];

/// Words that imply a league without naming it
const ALIASES: &[(&str, &str)] = &[
    ("baseball", "mlb"),
    ("basketball", "nba"),
    ("college football", "college-football"),
    ("stock car", "nascar"),
    ("pga", "golf"),
];

pub struct NewsAgent {
    feed: FeedClient,
}

impl NewsAgent {
    pub fn new(feed: FeedClient) -> Self {
        Self { feed }
    }

    /// The card this agent publishes at its well-known path.
    pub fn card(base_url: &str) -> AgentCard {
        AgentCard {
            name: NEWS_AGENT_NAME.to_string(),
            description: "Sports news headlines from league feeds".to_string(),
            url: base_url.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: AgentCapabilities { streaming: false },
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: vec![AgentSkill {
                id: "sports-news".to_string(),
                name: "Sports News".to_string(),
                description: "Latest headlines by league".to_string(),
                tags: LEAGUES.iter().map(|l| l.to_string()).collect(),
                examples: vec![
                    "Show news for mlb".to_string(),
                    "Fetch me the latest news for nascar".to_string(),
                    "What is the latest golf news?".to_string(),
                ],
            }],
        }
    }
}

/// Find the league a message is about. Checks explicit league names
/// first, then common aliases. `college-football` matches with either
/// a hyphen or a space.
fn detect_league(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    for league in LEAGUES {
        if lowered.contains(league) || lowered.contains(&league.replace('-', " ")) {
            return Some(league);
        }
    }
    for (alias, league) in ALIASES {
        if lowered.contains(alias) {
            return Some(league);
        }
    }
    None
}

#[async_trait]
impl TaskExecutor for NewsAgent {
    async fn execute(&self, message: &str, _session_id: &str) -> Result<String> {
        let Some(league) = detect_league(message) else {
            debug!("No league found in message; asking the user");
            return Ok(format!(
                "Which league do you want news for? I cover {}.",
                LEAGUES.join(", ")
            ));
        };

        debug!(league, "Fetching headlines");
        let headlines = self
            .feed
            .call_tool(NEWS_TOOL, serde_json::json!({ "sport": league }))
            .await?;

        if headlines.trim().is_empty() {
            Ok(format!("No {league} headlines right now."))
        } else {
            Ok(headlines)
        }
    }
}

/// Convenience for serving: the agent behind an `Arc` executor.
pub fn executor(feed: FeedClient) -> Arc<dyn TaskExecutor> {
    Arc::new(NewsAgent::new(feed))
}
