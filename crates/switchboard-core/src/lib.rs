//! Shared building blocks for the switchboard workspace
//!
//! Configuration loading with environment overrides, the provider seam the
//! routing planner talks through, and tool schema definitions.

pub mod config;
pub mod providers;
pub mod tools;

pub use config::{Config, RunMode};
pub use providers::{
    AnthropicProvider, ChatMessage, ChatResponse, ChatResponseBlock, LlmProvider, StopReason,
};
pub use tools::{ToolDefinition, json_schema};
