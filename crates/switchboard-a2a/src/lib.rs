//! A2A (Agent-to-Agent) protocol support for the switchboard
//!
//! Wire types for discovery and task exchange, the HTTP client the router
//! talks through, incremental SSE parsing for streamed task replies, and an
//! axum harness that serves any [`TaskExecutor`] as an A2A agent.

pub mod client;
pub mod protocol;
pub mod server;
pub mod sse;

pub use client::A2aClient;
pub use protocol::{
    AgentCapabilities, AgentCard, AgentSkill, StreamEvent, TaskResponse, TaskSendParams,
    TaskStatus,
};
pub use server::{A2aServer, TaskExecutor};
