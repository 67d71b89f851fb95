//! Typed errors raised by the routing layer
//!
//! Failures inside a remote agent are folded into reply text and never
//! surface as errors. The variants here are what the orchestration
//! itself can raise, and every one of them can be downgraded to a
//! user-safe reply line with [`RouterError::user_message`] so the chat
//! boundary never returns an error object.

use std::time::Duration;

use thiserror::Error;

/// Fatal startup failures. Raised only by router initialization.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// One or more required settings are absent. Every missing name is
    /// collected before failing so the operator fixes them in one pass.
    #[error("missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<String>),

    /// Every configured agent address failed discovery.
    #[error("no remote agents available ({0} address(es) configured, none reachable)")]
    NoAgentsAvailable(usize),
}

/// Errors raised by the router while handling a turn.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// A remote invocation failed below the aggregation layer, for
    /// example a refused connection or a task reported as failed.
    #[error("agent '{agent}' invocation failed: {source}")]
    RemoteInvocation {
        agent: String,
        #[source]
        source: anyhow::Error,
    },

    /// A remote agent went silent past its time bound. Any partial
    /// reply buffered before the deadline is discarded.
    #[error("agent '{agent}' timed out after {after:?}")]
    RemoteTimeout { agent: String, after: Duration },

    /// A turn is already in flight; the router takes one at a time.
    #[error("a turn is already being processed")]
    Busy,

    /// The router is not in a state that accepts this call.
    #[error("router is not ready (state: {state})")]
    NotReady { state: &'static str },
}

impl RouterError {
    /// Downgrade to a complete, user-safe reply line for the chat
    /// boundary.
    pub fn user_message(&self) -> String {
        match self {
            RouterError::Initialization(e) => {
                format!("The router could not start: {e}.")
            }
            RouterError::RemoteInvocation { agent, .. } => {
                format!("The '{agent}' agent did not return a usable reply.")
            }
            RouterError::RemoteTimeout { agent, after } => {
                format!("The '{agent}' agent did not respond within {after:?}.")
            }
            RouterError::Busy => {
                "Still working on the previous message. Please send that again in a moment."
                    .to_string()
            }
            RouterError::NotReady { .. } => {
                "The router is not ready to take messages right now.".to_string()
            }
        }
    }

    /// Short note substituted for a failed agent's contribution when
    /// replies from several agents are merged.
    pub fn inline_note(&self) -> String {
        match self {
            RouterError::RemoteInvocation { agent, source } => {
                format!("[{agent}] request failed: {source}")
            }
            RouterError::RemoteTimeout { agent, after } => {
                format!("[{agent}] timed out after {after:?}")
            }
            other => format!("[router] {other}"),
        }
    }
}
