//! Gateway wire types — JSON in and out of the chat surface

use serde::{Deserialize, Serialize};
use switchboard_a2a::AgentCard;

/// Client → Gateway chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Gateway → Client reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
}

/// Health probe payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agents: usize,
    pub state: String,
}

/// One discovered agent, as shown in the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub streaming: bool,
    pub skills: Vec<SkillSummary>,
}

/// One skill on an agent card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSummary {
    pub name: String,
    pub tags: Vec<String>,
}

impl AgentSummary {
    pub fn from_card(card: &AgentCard) -> Self {
        Self {
            name: card.name.clone(),
            description: card.description.clone(),
            streaming: card.capabilities.streaming,
            skills: card
                .skills
                .iter()
                .map(|skill| SkillSummary {
                    name: skill.name.clone(),
                    tags: skill.tags.clone(),
                })
                .collect(),
        }
    }
}
