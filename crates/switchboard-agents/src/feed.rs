//! Feed client for the news agent
//!
//! Talks MCP over HTTP: JSON-RPC 2.0 requests POSTed to a single
//! endpoint. The feed side exposes league news as MCP tools; this
//! client runs the initialize handshake, lists the tools, and calls
//! one per request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// A tool advertised by the feed, from `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP-over-HTTP client for one feed endpoint
#[derive(Debug)]
pub struct FeedClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl FeedClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run the MCP handshake. Optional for feeds that accept bare tool
    /// calls, but polite to the ones that track sessions.
    pub async fn initialize(&self) -> Result<Value> {
        let result = self
            .send_request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {
                        "name": "switchboard",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;

        debug!("Feed initialize response: {:?}", result);
        self.send_notification("notifications/initialized").await?;
        info!("Feed client connected to {}", self.endpoint);
        Ok(result)
    }

    /// Discover the tools the feed offers
    pub async fn list_tools(&self) -> Result<Vec<FeedTool>> {
        let result = self
            .send_request("tools/list", serde_json::json!({}))
            .await?;

        let tools: Vec<FeedTool> = serde_json::from_value(
            result
                .get("tools")
                .cloned()
                .unwrap_or(serde_json::json!([])),
        )
        .unwrap_or_default();

        debug!("Feed offers {} tool(s)", tools.len());
        Ok(tools)
    }

    /// Call a tool and return the joined text of its content blocks
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self
            .send_request(
                "tools/call",
                serde_json::json!({
                    "name": name,
                    "arguments": arguments,
                }),
            )
            .await?;

        if result
            .get("isError")
            .and_then(|e| e.as_bool())
            .unwrap_or(false)
        {
            let detail = content_text(&result);
            return Err(anyhow!("Feed tool '{}' reported an error: {}", name, detail));
        }

        if result.get("content").is_some() {
            Ok(content_text(&result))
        } else {
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }

    /// Send a JSON-RPC request and return its result value
    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("Feed request {} ({})", method, id);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach feed at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Feed request failed with status {status}: {body}");
        }

        let message: Value = response
            .json()
            .await
            .context("Invalid JSON from feed")?;

        if let Some(error) = message.get("error") {
            let msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(anyhow!("Feed error for '{}': {}", method, msg));
        }

        Ok(message.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Send a JSON-RPC notification; no response is expected
    async fn send_notification(&self, method: &str) -> Result<()> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": {},
        });

        self.http
            .post(&self.endpoint)
            .json(&notification)
            .send()
            .await
            .with_context(|| format!("Failed to notify feed at {}", self.endpoint))?;
        Ok(())
    }
}

/// Join the text of every content block in a tool result
fn content_text(result: &Value) -> String {
    result
        .get("content")
        .and_then(|c| c.as_array())
        .map(|content| {
            content
                .iter()
                .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
