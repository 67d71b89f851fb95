//! Agent selection
//!
//! Selection is a boundary: the router hands over the message text and
//! the discovered cards, and gets back the names of the agents that
//! should handle the turn, in call order. Both the LLM-backed planner
//! and the deterministic skill matcher honor the same contract, so the
//! strategy can be swapped without touching the orchestration.

mod llm;
mod skills;

pub use llm::LlmSelector;
pub use skills::SkillMatcher;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use switchboard_a2a::AgentCard;

/// Chooses which agents handle a message.
///
/// Implementations may return zero, one, or many names; every returned
/// name refers to a card in the given slice. Order is the order the
/// replies will be merged in.
#[async_trait]
pub trait AgentSelector: Send + Sync {
    async fn select(&self, message: &str, cards: &[Arc<AgentCard>]) -> Result<Vec<String>>;
}
