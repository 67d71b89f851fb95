//! Remote agent connection
//!
//! One connection per registered card. The connection picks the wire
//! shape from the card: streaming agents are invoked over SSE and their
//! frames folded by the aggregator, everything else gets a single
//! request/response round trip.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use switchboard_a2a::{A2aClient, AgentCard, TaskSendParams, TaskStatus};
use tracing::debug;

use crate::aggregator::{AggregatedResponse, aggregate};
use crate::error::RouterError;

#[derive(Debug, Clone)]
pub struct RemoteAgentConnection {
    card: Arc<AgentCard>,
    client: A2aClient,
    stream_idle_timeout: Duration,
}

impl RemoteAgentConnection {
    pub fn new(card: Arc<AgentCard>, client: A2aClient, stream_idle_timeout: Duration) -> Self {
        Self {
            card,
            client,
            stream_idle_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.card.name
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Send one task and fold the reply. Single attempt: transport and
    /// task failures map to typed errors for the caller to downgrade.
    pub async fn invoke(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<AggregatedResponse, RouterError> {
        let params = TaskSendParams::new(message, session_id);
        if self.card.capabilities.streaming {
            self.invoke_streaming(&params).await
        } else {
            self.invoke_batch(&params).await
        }
    }

    async fn invoke_streaming(
        &self,
        params: &TaskSendParams,
    ) -> Result<AggregatedResponse, RouterError> {
        debug!("Streaming task {} to {}", params.id, self.name());
        let mut rx = self
            .client
            .stream_task(&self.card.url, params)
            .await
            .map_err(|source| self.invocation_error(source))?;
        aggregate(&mut rx, self.stream_idle_timeout, self.name()).await
    }

    async fn invoke_batch(
        &self,
        params: &TaskSendParams,
    ) -> Result<AggregatedResponse, RouterError> {
        debug!("Sending task {} to {}", params.id, self.name());
        let response = self
            .client
            .send_task(&self.card.url, params)
            .await
            .map_err(|source| self.invocation_error(source))?;

        match response.status {
            TaskStatus::Failed | TaskStatus::Cancelled => {
                let detail = response
                    .result
                    .unwrap_or_else(|| format!("task ended as {}", response.status));
                Err(self.invocation_error(anyhow!(detail)))
            }
            status => {
                let mut folded =
                    AggregatedResponse::complete_text(response.result.unwrap_or_default());
                folded.requires_input = status == TaskStatus::InputRequired;
                Ok(folded)
            }
        }
    }

    fn invocation_error(&self, source: anyhow::Error) -> RouterError {
        RouterError::RemoteInvocation {
            agent: self.name().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_a2a::AgentCapabilities;

    fn card(streaming: bool) -> Arc<AgentCard> {
        Arc::new(AgentCard {
            name: "unreachable".to_string(),
            description: "test".to_string(),
            // Port 1 refuses connections on loopback.
            url: "http://127.0.0.1:1".to_string(),
            version: "0.1.0".to_string(),
            capabilities: AgentCapabilities { streaming },
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: vec![],
        })
    }

    #[tokio::test]
    async fn test_batch_invoke_against_refused_port_is_invocation_error() {
        let connection =
            RemoteAgentConnection::new(card(false), A2aClient::new(), Duration::from_secs(1));
        let err = connection.invoke("hello", "session-1").await.unwrap_err();
        match err {
            RouterError::RemoteInvocation { agent, .. } => assert_eq!(agent, "unreachable"),
            other => panic!("expected RemoteInvocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_streaming_invoke_against_refused_port_is_invocation_error() {
        let connection =
            RemoteAgentConnection::new(card(true), A2aClient::new(), Duration::from_secs(1));
        let err = connection.invoke("hello", "session-1").await.unwrap_err();
        assert!(matches!(err, RouterError::RemoteInvocation { .. }));
    }

    #[test]
    fn test_connection_exposes_card() {
        let connection =
            RemoteAgentConnection::new(card(true), A2aClient::new(), Duration::from_secs(1));
        assert_eq!(connection.name(), "unreachable");
        assert!(connection.card().capabilities.streaming);
    }
}
