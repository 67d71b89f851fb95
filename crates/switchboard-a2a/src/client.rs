//! A2A client — discovers agent cards and sends tasks to remote agents

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{
    AGENT_CARD_PATH, AgentCard, StreamEvent, TASKS_PATH, TASKS_STREAM_PATH, TaskResponse,
    TaskSendParams,
};
use crate::sse::SseBuffer;

/// Events buffered per stream before the reader applies backpressure
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// A2A client for communicating with remote agents.
///
/// Card fetches and single round-trip tasks are bounded by the request
/// timeout; streamed tasks run without an overall deadline (their silence
/// and total duration are bounded by the consumer).
#[derive(Clone, Debug)]
pub struct A2aClient {
    http: Client,
    request_timeout: Duration,
}

impl Default for A2aClient {
    fn default() -> Self {
        Self::new()
    }
}

impl A2aClient {
    pub fn new() -> Self {
        Self::with_request_timeout(Duration::from_secs(30))
    }

    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build HTTP client"),
            request_timeout,
        }
    }

    /// Fetch an agent's capability card from the well-known path
    pub async fn fetch_agent_card(&self, base_url: &str, token: Option<&str>) -> Result<AgentCard> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), AGENT_CARD_PATH);
        debug!("Fetching agent card from {}", url);

        let mut req = self.http.get(&url).timeout(self.request_timeout);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to connect to agent at {}", url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Agent card request failed: HTTP {}", resp.status()));
        }

        let card: AgentCard = resp.json().await.context("Failed to parse agent card")?;

        info!(
            "Fetched agent card: {} ({} skills, streaming: {})",
            card.name,
            card.skills.len(),
            card.capabilities.streaming
        );
        Ok(card)
    }

    /// Send a task and wait for its final response in one round trip
    pub async fn send_task(&self, base_url: &str, params: &TaskSendParams) -> Result<TaskResponse> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), TASKS_PATH);
        debug!("Sending task {} to {}", params.id, url);

        let resp = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(params)
            .send()
            .await
            .with_context(|| format!("Failed to send task to {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Task request failed: HTTP {} — {}", status, body));
        }

        let task: TaskResponse = resp.json().await.context("Failed to parse task response")?;

        if task.id != params.id {
            warn!(
                "Task response id {} does not match request id {}",
                task.id, params.id
            );
        }

        info!("Task {} finished (status: {})", task.id, task.status);
        Ok(task)
    }

    /// Open a streamed task and forward its decoded frames.
    ///
    /// The returned channel closes when the stream ends; dropping the
    /// receiver stops the reader and releases the connection.
    pub async fn stream_task(
        &self,
        base_url: &str,
        params: &TaskSendParams,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), TASKS_STREAM_PATH);
        debug!("Opening task stream {} to {}", params.id, url);

        let resp = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .with_context(|| format!("Failed to open task stream to {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Task stream failed: HTTP {} — {}", status, body));
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let task_id = params.id.clone();

        tokio::spawn(async move {
            let mut body = resp.bytes_stream();
            let mut buffer = SseBuffer::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        // Mid-stream transport errors end the stream; the
                        // consumer sees a normal close
                        warn!("Task {} stream ended early: {}", task_id, e);
                        return;
                    }
                };
                for payload in buffer.push(&chunk) {
                    if tx.send(StreamEvent::from_json(&payload)).await.is_err() {
                        debug!("Task {} stream receiver dropped; closing", task_id);
                        return;
                    }
                }
            }

            if let Some(payload) = buffer.finish() {
                let _ = tx.send(StreamEvent::from_json(&payload)).await;
            }
            debug!("Task {} stream complete", task_id);
        });

        Ok(rx)
    }
}
