//! Switchboard router
//!
//! The orchestration layer between a chat surface and a fleet of remote
//! A2A agents. At startup the router discovers agent cards into a
//! read-only [`CapabilityRegistry`]; each turn it asks an
//! [`AgentSelector`] which agents should handle the message, invokes
//! them concurrently, folds every reply stream through the
//! [`aggregator`], and merges the results into one reply string.
//!
//! The router processes one turn at a time. Failures below the router
//! become inline notes in the reply; only the typed errors in
//! [`error`] cross the boundary to callers.

pub mod aggregator;
pub mod connection;
pub mod conversation;
pub mod error;
pub mod registry;
pub mod router;
pub mod selector;

pub use aggregator::{AggregatedResponse, NO_RESPONSE_PLACEHOLDER, aggregate};
pub use connection::RemoteAgentConnection;
pub use conversation::{ConversationState, Speaker, TurnEntry};
pub use error::{InitializationError, RouterError};
pub use registry::CapabilityRegistry;
pub use router::{REPLY_SEPARATOR, Router, RouterState, SENTINEL_NO_REPLY};
pub use selector::{AgentSelector, LlmSelector, SkillMatcher};
