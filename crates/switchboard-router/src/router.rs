//! The router
//!
//! Owns the turn lifecycle: take one chat message, ask the selector
//! which agents should handle it, invoke them concurrently, and merge
//! the folded replies into a single string. One turn at a time; a
//! second message while one is in flight is rejected as busy rather
//! than queued.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use switchboard_a2a::A2aClient;
use switchboard_core::{Config, RunMode};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregator::AggregatedResponse;
use crate::connection::RemoteAgentConnection;
use crate::conversation::{ConversationState, TurnEntry};
use crate::error::{InitializationError, RouterError};
use crate::registry::CapabilityRegistry;
use crate::selector::AgentSelector;

/// Fixed reply when no agent contributed anything for a turn. Callers
/// can rely on the reply starting with this exact string.
pub const SENTINEL_NO_REPLY: &str = "No response received from any agent. Please try again.";

/// Separator between agent contributions in a merged reply.
pub const REPLY_SEPARATOR: &str = "\n\n---\n\n";

/// Lifecycle states. `Uninitialized` only exists before
/// [`Router::initialize`] returns, so a constructed router is never
/// observable in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Uninitialized,
    Ready,
    AwaitingReply,
    ShuttingDown,
    Closed,
}

impl RouterState {
    pub fn name(&self) -> &'static str {
        match self {
            RouterState::Uninitialized => "uninitialized",
            RouterState::Ready => "ready",
            RouterState::AwaitingReply => "awaiting_reply",
            RouterState::ShuttingDown => "shutting_down",
            RouterState::Closed => "closed",
        }
    }
}

pub struct Router {
    state: RwLock<RouterState>,
    connections: RwLock<HashMap<String, RemoteAgentConnection>>,
    registry: CapabilityRegistry,
    selector: Arc<dyn AgentSelector>,
    conversation: Mutex<ConversationState>,
    agent_timeout: Duration,
}

// Manual impl because `dyn AgentSelector` has no `Debug` bound.
impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("state", &self.state)
            .field("connections", &self.connections)
            .field("registry", &self.registry)
            .field("conversation", &self.conversation)
            .field("agent_timeout", &self.agent_timeout)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Check settings, discover agents and return a ready router.
    ///
    /// Settings are validated before any network call so a
    /// misconfigured deployment fails with the complete list of missing
    /// names instead of a connection error. Discovery tolerates
    /// unreachable agents and fails only when none respond.
    pub async fn initialize(
        config: &Config,
        selector: Arc<dyn AgentSelector>,
    ) -> Result<Self, RouterError> {
        let missing = config.missing_settings(RunMode::Serve);
        if !missing.is_empty() {
            return Err(InitializationError::MissingSettings(missing).into());
        }

        let client = A2aClient::with_request_timeout(config.router.agent_timeout());
        let registry =
            CapabilityRegistry::discover(&client, &config.router.agent_addresses()).await?;

        let connections: HashMap<String, RemoteAgentConnection> = registry
            .cards()
            .into_iter()
            .map(|card| {
                let name = card.name.clone();
                let connection = RemoteAgentConnection::new(
                    card,
                    client.clone(),
                    config.router.stream_idle_timeout(),
                );
                (name, connection)
            })
            .collect();

        let conversation = ConversationState::new();
        info!(
            "Router ready: {} agent(s) [{}], session {}",
            registry.len(),
            registry.names().join(", "),
            conversation.session_id()
        );

        Ok(Self {
            state: RwLock::new(RouterState::Ready),
            connections: RwLock::new(connections),
            registry,
            selector,
            conversation: Mutex::new(conversation),
            agent_timeout: config.router.agent_timeout(),
        })
    }

    pub fn state(&self) -> RouterState {
        *self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub async fn session_id(&self) -> String {
        self.conversation.lock().await.session_id().to_string()
    }

    /// Snapshot of the conversation history.
    pub async fn history(&self) -> Vec<TurnEntry> {
        self.conversation.lock().await.entries().to_vec()
    }

    /// Handle one chat turn end to end and return the merged reply.
    ///
    /// The reply is always a non-empty string: agent failures become
    /// inline notes, an empty selection becomes the sentinel. The
    /// errors this returns are the router's own (busy, not ready),
    /// never a remote agent's.
    pub async fn handle_message(&self, message: &str) -> Result<String, RouterError> {
        self.begin_turn()?;
        // Restores Ready even when the caller drops this future
        // mid-turn.
        let _guard = TurnGuard { state: &self.state };

        let session_id = {
            let mut conversation = self.conversation.lock().await;
            conversation.record_user(message);
            conversation.session_id().to_string()
        };

        let cards = self.registry.cards();
        let selected = match self.selector.select(message, &cards).await {
            Ok(names) => names,
            Err(e) => {
                warn!("Selection failed: {:#}; no agents will be invoked", e);
                Vec::new()
            }
        };
        debug!(agents = ?selected, "Agents selected for this turn");

        let reply = self.invoke_selected(message, &session_id, &selected).await;

        self.conversation.lock().await.record_agent(&reply);
        Ok(reply)
    }

    fn begin_turn(&self) -> Result<(), RouterError> {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        match *state {
            RouterState::Ready => {
                *state = RouterState::AwaitingReply;
                Ok(())
            }
            RouterState::AwaitingReply => Err(RouterError::Busy),
            other => Err(RouterError::NotReady {
                state: other.name(),
            }),
        }
    }

    /// Fan out to every selected agent concurrently and merge the
    /// outcomes in selection order.
    async fn invoke_selected(
        &self,
        message: &str,
        session_id: &str,
        selected: &[String],
    ) -> String {
        if selected.is_empty() {
            debug!("No agent selected; replying with the sentinel");
            return SENTINEL_NO_REPLY.to_string();
        }

        let mut join_set = JoinSet::new();
        {
            let connections = self.connections.read().unwrap_or_else(|p| p.into_inner());
            for (order, name) in selected.iter().enumerate() {
                let Some(connection) = connections.get(name) else {
                    warn!("Selected agent '{}' is not registered; skipping", name);
                    continue;
                };
                let connection = connection.clone();
                let message = message.to_string();
                let session_id = session_id.to_string();
                let deadline = self.agent_timeout;
                join_set.spawn(async move {
                    let outcome =
                        match tokio::time::timeout(deadline, connection.invoke(&message, &session_id))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(RouterError::RemoteTimeout {
                                agent: connection.name().to_string(),
                                after: deadline,
                            }),
                        };
                    (order, connection.name().to_string(), outcome)
                });
            }
        }

        let mut outcomes: Vec<(usize, String, Result<AggregatedResponse, RouterError>)> =
            Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Agent invocation task did not complete: {}", e),
            }
        }
        outcomes.sort_by_key(|(order, ..)| *order);

        merge_outcomes(&outcomes)
    }

    /// Shut down: wipe the conversation and drop the agent
    /// connections. Idempotent; safe to call from any state and again
    /// after it returns.
    pub async fn cleanup(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
            if *state == RouterState::Closed {
                debug!("Cleanup called on a closed router; nothing to do");
                return;
            }
            *state = RouterState::ShuttingDown;
        }

        self.conversation.lock().await.clear();
        self.connections
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .clear();

        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        *state = RouterState::Closed;
        info!("Router closed");
    }
}

/// Restores `Ready` when a turn ends for any reason, including the
/// handling future being dropped. Leaves other states alone so a
/// concurrent shutdown is not undone.
struct TurnGuard<'a> {
    state: &'a RwLock<RouterState>,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        if *state == RouterState::AwaitingReply {
            *state = RouterState::Ready;
        }
    }
}

/// Merge per-agent outcomes into one reply. Successful replies keep
/// selection order with a separator between them; failures contribute
/// inline notes. When nothing succeeded the sentinel leads and the
/// notes stay visible after it.
fn merge_outcomes(outcomes: &[(usize, String, Result<AggregatedResponse, RouterError>)]) -> String {
    if outcomes.is_empty() {
        return SENTINEL_NO_REPLY.to_string();
    }

    let mut sections = Vec::with_capacity(outcomes.len());
    let mut any_success = false;
    for (_, name, outcome) in outcomes {
        match outcome {
            Ok(response) => {
                any_success = true;
                if response.requires_input {
                    debug!("Agent {} asked for further user input", name);
                }
                sections.push(response.text.clone());
            }
            Err(e) => {
                warn!("Agent {} contributed an error: {}", name, e);
                sections.push(e.inline_note());
            }
        }
    }

    if any_success {
        sections.join(REPLY_SEPARATOR)
    } else {
        format!(
            "{}{}{}",
            SENTINEL_NO_REPLY,
            REPLY_SEPARATOR,
            sections.join(REPLY_SEPARATOR)
        )
    }
}
