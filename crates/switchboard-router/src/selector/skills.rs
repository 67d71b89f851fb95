//! Deterministic selection by skill metadata
//!
//! Scores each card's tags, skill names, descriptions and examples
//! against the message and keeps the cards that score close to the
//! best. No credentials, no network, stable results. Used on its own
//! when no planner is configured and as the fallback when the planner
//! call fails.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use switchboard_a2a::AgentCard;
use tracing::debug;

use super::AgentSelector;

const TAG_WEIGHT: u32 = 4;
const NAME_WEIGHT: u32 = 2;
const OVERLAP_WEIGHT: u32 = 1;

/// Common words that carry no routing signal.
const STOPWORDS: &[&str] = &[
    "about", "and", "any", "are", "can", "did", "for", "from", "get", "give", "have", "how", "its",
    "that", "the", "this", "was", "were", "what", "whats", "when", "where", "which", "who", "will",
    "with", "you", "your",
];

#[derive(Debug, Default)]
pub struct SkillMatcher;

impl SkillMatcher {
    pub fn new() -> Self {
        Self
    }

    fn score(message_tokens: &HashSet<String>, card: &AgentCard) -> u32 {
        let mut score = 0;

        let mut tag_hits: HashSet<&str> = HashSet::new();
        let mut name_hits: HashSet<String> = HashSet::new();
        let mut overlap_hits: HashSet<String> = HashSet::new();

        for skill in &card.skills {
            for tag in &skill.tags {
                // Multi-word tags match when every word appears.
                let tag_tokens = tokenize(tag);
                if !tag_tokens.is_empty() && tag_tokens.iter().all(|t| message_tokens.contains(t))
                {
                    tag_hits.insert(tag.as_str());
                }
            }
            for token in tokenize(&skill.name) {
                if message_tokens.contains(&token) {
                    name_hits.insert(token);
                }
            }
            for example in &skill.examples {
                for token in tokenize(example) {
                    if message_tokens.contains(&token) {
                        overlap_hits.insert(token);
                    }
                }
            }
            for token in tokenize(&skill.description) {
                if message_tokens.contains(&token) {
                    overlap_hits.insert(token);
                }
            }
        }
        for token in tokenize(&card.description) {
            if message_tokens.contains(&token) {
                overlap_hits.insert(token);
            }
        }

        score += tag_hits.len() as u32 * TAG_WEIGHT;
        score += name_hits.len() as u32 * NAME_WEIGHT;
        score += overlap_hits.len() as u32 * OVERLAP_WEIGHT;
        score
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

#[async_trait]
impl AgentSelector for SkillMatcher {
    async fn select(&self, message: &str, cards: &[Arc<AgentCard>]) -> Result<Vec<String>> {
        let message_tokens: HashSet<String> = tokenize(message).into_iter().collect();

        let mut scored: Vec<(u32, &str)> = cards
            .iter()
            .map(|card| (Self::score(&message_tokens, card), card.name.as_str()))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Best first; ties broken by name so results are stable.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(b.1)));

        let Some(&(best, _)) = scored.first() else {
            debug!("No card scored above zero for this message");
            return Ok(Vec::new());
        };

        // Keep every card within half of the best score.
        let selected: Vec<String> = scored
            .iter()
            .filter(|(score, _)| score * 2 >= best)
            .map(|(_, name)| name.to_string())
            .collect();
        debug!(best, agents = ?selected, "Skill matcher selection");
        Ok(selected)
    }
}
