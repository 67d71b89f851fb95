//! switchboard-gateway
//!
//! The HTTP surface in front of the router: one chat endpoint, a health
//! probe, and a directory of the discovered agents. The chat endpoint
//! always answers 200 with reply text; router errors are downgraded to
//! user-safe lines before they reach the wire.

pub mod protocol;
pub mod server;

pub use protocol::{AgentSummary, ChatRequest, ChatResponse, HealthResponse, SkillSummary};
pub use server::GatewayServer;
