//! Anthropic Messages API provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::types::{
    ChatMessage, ChatResponse, ChatResponseBlock, ChatUsage, LlmProvider, StopReason,
};
use crate::tools::ToolDefinition;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Default model for planning calls
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Provider backed by the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<&'a ToolDefinition>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ApiContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: ApiUsage,
}

/// Response content block, decoded permissively so new block kinds
/// are skipped instead of failing the whole response
#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicProvider {
    /// Create a provider with the given API key and model
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
        }
    }
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("end_turn") => StopReason::EndTurn,
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    }
}

fn map_blocks(blocks: Vec<ApiContentBlock>) -> Vec<ChatResponseBlock> {
    let mut mapped = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.kind.as_str() {
            "text" => {
                if let Some(text) = block.text {
                    mapped.push(ChatResponseBlock::Text { text });
                }
            }
            "tool_use" => {
                if let (Some(id), Some(name)) = (block.id, block.name) {
                    mapped.push(ChatResponseBlock::ToolCall {
                        id,
                        name,
                        input: block.input.unwrap_or(Value::Null),
                    });
                }
            }
            other => {
                debug!(kind = other, "Skipping unrecognized response block");
            }
        }
    }
    mapped
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        system: &str,
    ) -> Result<ChatResponse> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            tools: tools.iter().collect(),
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Anthropic chat request"
        );

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send Anthropic chat request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic chat failed with status {status}: {body}");
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic chat response")?;

        Ok(ChatResponse {
            stop_reason: map_stop_reason(api_response.stop_reason.as_deref()),
            usage: ChatUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
            blocks: map_blocks(api_response.content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::json_schema;

    #[test]
    fn test_request_serialization_with_tools() {
        let def = ToolDefinition {
            name: "select_agents".to_string(),
            description: "Pick agents".to_string(),
            input_schema: json_schema(serde_json::json!({}), vec![]),
        };
        let messages = [ChatMessage::user("route this")];
        let request = ApiRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 1024,
            system: "You are a router.",
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            tools: vec![&def],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-5");
        assert_eq!(json["system"], "You are a router.");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "route this");
        assert_eq!(json["tools"][0]["name"], "select_agents");
    }

    #[test]
    fn test_request_skips_empty_system_and_tools() {
        let request = ApiRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 1024,
            system: "",
            messages: vec![],
            tools: vec![],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_response_deserialization_text_and_tool_use() {
        let json = serde_json::json!({
            "content": [
                { "type": "text", "text": "Routing to the results agent." },
                {
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "select_agents",
                    "input": { "agents": ["sports-results"] }
                }
            ],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 120, "output_tokens": 30 }
        });

        let api: ApiResponse = serde_json::from_value(json).unwrap();
        let blocks = map_blocks(api.content);
        assert_eq!(blocks.len(), 2);
        match &blocks[1] {
            ChatResponseBlock::ToolCall { name, input, .. } => {
                assert_eq!(name, "select_agents");
                assert_eq!(input["agents"][0], "sports-results");
            }
            other => panic!("expected tool call, got {other:?}"),
        }
        assert_eq!(map_stop_reason(api.stop_reason.as_deref()), StopReason::ToolUse);
        assert_eq!(api.usage.input_tokens, 120);
    }

    #[test]
    fn test_unrecognized_block_kind_skipped() {
        let json = serde_json::json!({
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "done" }
            ],
            "stop_reason": "end_turn"
        });

        let api: ApiResponse = serde_json::from_value(json).unwrap();
        let blocks = map_blocks(api.content);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("end_turn")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("tool_use")), StopReason::ToolUse);
        assert_eq!(map_stop_reason(Some("max_tokens")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("pause_turn")), StopReason::Unknown);
        assert_eq!(map_stop_reason(None), StopReason::Unknown);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = AnthropicProvider::new("sk-ant-secret".to_string(), "m".to_string());
        let debug = format!("{provider:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-ant-secret"));
    }
}
