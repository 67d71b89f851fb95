//! LLM-backed selection through the provider seam
//!
//! Renders the discovered cards into a system prompt and asks the model
//! to pick agents with a single tool call. Any planner failure, from a
//! transport error to a malformed tool call, falls back to the
//! deterministic [`SkillMatcher`] so routing keeps working without the
//! model.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use switchboard_a2a::AgentCard;
use switchboard_core::{ChatMessage, ChatResponse, LlmProvider, ToolDefinition, json_schema};
use tracing::{debug, warn};

use super::{AgentSelector, SkillMatcher};

const SELECT_TOOL: &str = "select_agents";

pub struct LlmSelector {
    provider: Arc<dyn LlmProvider>,
    fallback: SkillMatcher,
}

impl LlmSelector {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            fallback: SkillMatcher::new(),
        }
    }

    fn system_prompt(cards: &[Arc<AgentCard>]) -> String {
        let mut prompt = String::from(
            "You are a switchboard for specialist agents. Decide which agents should \
             handle the user's message.\n\nAgents:\n",
        );
        prompt.push_str(&render_cards(cards));
        prompt.push_str(
            "\nCall the select_agents tool with the chosen agent names in the order \
             they should run. Pick none when no agent fits the message.",
        );
        prompt
    }

    fn tool_definition() -> ToolDefinition {
        ToolDefinition {
            name: SELECT_TOOL.to_string(),
            description: "Select the agents that should handle the user's message".to_string(),
            input_schema: json_schema(
                json!({
                    "agents": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Agent names in call order; empty when none fit"
                    }
                }),
                vec!["agents"],
            ),
        }
    }

    /// Pull the agent list out of the tool call, keeping only names
    /// that refer to known cards. `None` means the response carried no
    /// usable selection at all.
    fn parse_selection(response: &ChatResponse, cards: &[Arc<AgentCard>]) -> Option<Vec<String>> {
        let input = response.tool_input(SELECT_TOOL)?;
        let agents = input.get("agents")?.as_array()?;

        let mut selected = Vec::new();
        for value in agents {
            let Some(name) = value.as_str() else { continue };
            if !cards.iter().any(|card| card.name == name) {
                warn!("Planner selected unknown agent '{}'; ignoring", name);
                continue;
            }
            if !selected.iter().any(|s| s == name) {
                selected.push(name.to_string());
            }
        }
        Some(selected)
    }
}

fn render_cards(cards: &[Arc<AgentCard>]) -> String {
    let mut out = String::new();
    for card in cards {
        out.push_str(&format!("- {}: {}\n", card.name, card.description));
        for skill in &card.skills {
            out.push_str(&format!(
                "  skill: {} [{}] {}\n",
                skill.name,
                skill.tags.join(", "),
                skill.description
            ));
            if let Some(example) = skill.examples.first() {
                out.push_str(&format!("    e.g. \"{example}\"\n"));
            }
        }
    }
    out
}

#[async_trait]
impl AgentSelector for LlmSelector {
    async fn select(&self, message: &str, cards: &[Arc<AgentCard>]) -> Result<Vec<String>> {
        let system = Self::system_prompt(cards);
        let tools = vec![Self::tool_definition()];
        let messages = vec![ChatMessage::user(message)];

        match self.provider.chat(&messages, &tools, &system).await {
            Ok(response) => {
                if let Some(selected) = Self::parse_selection(&response, cards) {
                    debug!(agents = ?selected, "Planner selection");
                    return Ok(selected);
                }
                warn!("Planner returned no usable selection; falling back to skill matching");
            }
            Err(e) => {
                warn!("Planner call failed: {:#}; falling back to skill matching", e);
            }
        }
        self.fallback.select(message, cards).await
    }
}
