//! Workspace configuration: TOML file plus environment overrides
//!
//! Secrets (API keys) are never read from the file, only from the
//! environment. [`Config::missing_settings`] enumerates every required
//! setting that is absent for a given run mode so startup can fail once
//! with the complete list instead of one var at a time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Which process is starting, for required-settings checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Router plus chat gateway
    Serve,
    /// Sports-results specialist server
    ResultsAgent,
    /// Sports-news specialist server
    NewsAgent,
    /// Registry discovery only (diagnostics)
    Discover,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub agents: AgentServerConfig,
}

/// Router-side settings: which remote agents to front, and how long to
/// wait for them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Base URLs of the remote agents to discover at startup
    #[serde(default)]
    pub remote_agents: Vec<String>,
    /// Ceiling for a single agent invocation within a turn, in seconds
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
    /// How long a stream may stay silent before it counts as timed out
    #[serde(default = "default_stream_idle_secs")]
    pub stream_idle_timeout_secs: u64,
}

/// Planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Selection strategy: "anthropic" (LLM planner) or "skills"
    /// (deterministic skill matching)
    #[serde(default = "default_planner_provider")]
    pub provider: String,
    #[serde(default = "default_planner_model")]
    pub model: String,
    /// From `ANTHROPIC_API_KEY` only, never the config file
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Chat gateway bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

/// Web search settings for the results specialist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// From `TAVILY_API_KEY` only, never the config file
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Feed service settings for the news specialist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the MCP feed service
    #[serde(default)]
    pub url: String,
}

/// Bind settings for the specialist agent servers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServerConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_results_port")]
    pub results_port: u16,
    #[serde(default = "default_news_port")]
    pub news_port: u16,
}

fn default_agent_timeout_secs() -> u64 {
    30
}

fn default_stream_idle_secs() -> u64 {
    15
}

fn default_planner_provider() -> String {
    "anthropic".to_string()
}

fn default_planner_model() -> String {
    crate::providers::anthropic::DEFAULT_MODEL.to_string()
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8083
}

fn default_results_port() -> u16 {
    10001
}

fn default_news_port() -> u16 {
    10002
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            remote_agents: Vec::new(),
            agent_timeout_secs: default_agent_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_secs(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            provider: default_planner_provider(),
            model: default_planner_model(),
            api_key: None,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

impl Default for AgentServerConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            results_port: default_results_port(),
            news_port: default_news_port(),
        }
    }
}

impl RouterConfig {
    /// Remote agent addresses with whitespace trimmed and unparsable
    /// entries dropped (with a warning)
    pub fn agent_addresses(&self) -> Vec<String> {
        self.remote_agents
            .iter()
            .map(|a| a.trim().trim_end_matches('/').to_string())
            .filter(|a| !a.is_empty())
            .filter(|a| match Url::parse(a) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Ignoring invalid remote agent address '{}': {}", a, e);
                    false
                }
            })
            .collect()
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration: explicit path, else the default path if it
    /// exists, else built-in defaults. Environment overrides are applied
    /// on top in every case.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                Self::from_toml_str(&raw)?
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => {
                    let raw = std::fs::read_to_string(&p)
                        .with_context(|| format!("Failed to read config file {}", p.display()))?;
                    Self::from_toml_str(&raw)?
                }
                _ => Config::default(),
            },
        };

        config.apply_env_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a TOML document into a config
    pub fn from_toml_str(raw: &str) -> Result<Config> {
        toml::from_str(raw).context("Failed to parse config TOML")
    }

    /// Default config file location (`~/.config/switchboard/config.toml`
    /// on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("switchboard").join("config.toml"))
    }

    /// Apply environment overrides through a lookup function (injectable
    /// for tests, since mutating process env is unsafe in edition 2024)
    pub fn apply_env_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = get("SWITCHBOARD_REMOTE_AGENTS") {
            self.router.remote_agents = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(provider) = get("SWITCHBOARD_PLANNER") {
            self.planner.provider = provider;
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.planner.api_key = Some(key);
        }
        if let Some(key) = get("TAVILY_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(url) = get("SWITCHBOARD_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(host) = get("SWITCHBOARD_GATEWAY_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("SWITCHBOARD_GATEWAY_PORT") {
            match port.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => warn!("Ignoring invalid SWITCHBOARD_GATEWAY_PORT '{}'", port),
            }
        }
    }

    /// Every required setting that is absent for the given run mode.
    /// Empty means the mode can start.
    pub fn missing_settings(&self, mode: RunMode) -> Vec<String> {
        let mut missing = Vec::new();
        match mode {
            RunMode::Serve => {
                if self.router.agent_addresses().is_empty() {
                    missing.push(
                        "router.remote_agents (or SWITCHBOARD_REMOTE_AGENTS)".to_string(),
                    );
                }
                if self.planner.provider == "anthropic" && self.planner.api_key.is_none() {
                    missing.push("ANTHROPIC_API_KEY".to_string());
                }
            }
            RunMode::ResultsAgent => {
                if self.search.api_key.is_none() {
                    missing.push("TAVILY_API_KEY".to_string());
                }
            }
            RunMode::NewsAgent => {
                if self.feed.url.trim().is_empty() {
                    missing.push("feed.url (or SWITCHBOARD_FEED_URL)".to_string());
                }
            }
            RunMode::Discover => {
                if self.router.agent_addresses().is_empty() {
                    missing.push(
                        "router.remote_agents (or SWITCHBOARD_REMOTE_AGENTS)".to_string(),
                    );
                }
            }
        }
        missing
    }
}
