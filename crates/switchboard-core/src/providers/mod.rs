//! LLM provider abstraction used by the routing planner
//!
//! The planner speaks to models through the [`LlmProvider`] trait so the
//! selection strategy stays swappable; [`AnthropicProvider`] is the shipped
//! implementation.

pub mod anthropic;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use types::{
    ChatMessage, ChatResponse, ChatResponseBlock, ChatRole, ChatUsage, LlmProvider, StopReason,
};
