//! switchboard — routes chat to remote A2A specialist agents
//!
//! Subcommands cover the whole deployment: `serve` runs the router and
//! chat gateway, `results-agent` and `news-agent` run the two
//! specialists, `agents` prints what discovery finds.
//!
//! Usage:
//!   switchboard serve
//!   switchboard results-agent --port 10001
//!   switchboard news-agent
//!   switchboard agents

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use switchboard_a2a::{A2aClient, A2aServer};
use switchboard_agents::{FeedClient, NewsAgent, ResultsAgent, SearchClient};
use switchboard_core::{AnthropicProvider, Config, RunMode};
use switchboard_gateway::GatewayServer;
use switchboard_router::{AgentSelector, LlmSelector, Router, SkillMatcher};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Routes chat to remote A2A specialist agents")]
struct Cli {
    /// Path to the config file (defaults to the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the router and the chat gateway
    Serve,
    /// Start the sports results agent
    ResultsAgent {
        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start the sports news agent
    NewsAgent {
        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Discover the configured agents and print their cards
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::ResultsAgent { port } => results_agent(config, port).await,
        Command::NewsAgent { port } => news_agent(config, port).await,
        Command::Agents => list_agents(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("switchboard v{} starting", env!("CARGO_PKG_VERSION"));

    let selector = build_selector(&config);
    let router = Arc::new(Router::initialize(&config, selector).await?);

    let bind_addr = config.gateway.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind gateway to {bind_addr}"))?;

    GatewayServer::new(router).serve(listener).await
}

/// Pick the selection strategy from config: the LLM planner when the
/// provider is anthropic, plain skill matching otherwise.
fn build_selector(config: &Config) -> Arc<dyn AgentSelector> {
    if config.planner.provider == "anthropic" {
        if let Some(api_key) = config.planner.api_key.clone() {
            let provider = AnthropicProvider::new(api_key, config.planner.model.clone());
            return Arc::new(LlmSelector::new(Arc::new(provider)));
        }
        // Router::initialize reports the missing key; this path only
        // runs when validation is relaxed.
        warn!("Planner provider is anthropic but no API key is set; using skill matching");
    } else {
        info!("Planner provider '{}'; using skill matching", config.planner.provider);
    }
    Arc::new(SkillMatcher::new())
}

async fn results_agent(config: Config, port: Option<u16>) -> Result<()> {
    fail_on_missing(&config, RunMode::ResultsAgent)?;
    let api_key = config
        .search
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("TAVILY_API_KEY not set"))?;

    let port = port.unwrap_or(config.agents.results_port);
    let listener = bind_agent(&config.agents.host, port).await?;
    let base_url = agent_base_url(&listener)?;

    info!("sports-results agent v{} starting", env!("CARGO_PKG_VERSION"));
    let card = ResultsAgent::card(&base_url);
    A2aServer::new(card, switchboard_agents::results::executor(SearchClient::new(api_key)))
        .serve(listener)
        .await
}

async fn news_agent(config: Config, port: Option<u16>) -> Result<()> {
    fail_on_missing(&config, RunMode::NewsAgent)?;

    let feed = FeedClient::new(config.feed.url.clone());
    if let Err(e) = feed.initialize().await {
        warn!("Feed handshake with {} failed: {:#}", feed.endpoint(), e);
    }

    let port = port.unwrap_or(config.agents.news_port);
    let listener = bind_agent(&config.agents.host, port).await?;
    let base_url = agent_base_url(&listener)?;

    info!("sports-news agent v{} starting", env!("CARGO_PKG_VERSION"));
    let card = NewsAgent::card(&base_url);
    A2aServer::new(card, switchboard_agents::news::executor(feed))
        .serve(listener)
        .await
}

async fn list_agents(config: Config) -> Result<()> {
    let addresses = config.router.agent_addresses();
    if addresses.is_empty() {
        anyhow::bail!(
            "No agents configured. Set router.remote_agents in the config file \
             or the SWITCHBOARD_REMOTE_AGENTS environment variable."
        );
    }

    let client = A2aClient::new();
    let mut found = 0;
    for address in &addresses {
        match client.fetch_agent_card(address, None).await {
            Ok(card) => {
                found += 1;
                println!("{} v{}  [{}]", card.name, card.version, address);
                println!("  {}", card.description);
                println!(
                    "  streaming: {}",
                    if card.capabilities.streaming { "yes" } else { "no" }
                );
                for skill in &card.skills {
                    println!("  skill: {} ({})", skill.name, skill.tags.join(", "));
                }
                println!();
            }
            Err(e) => {
                println!("{address}  unreachable: {e:#}");
                println!();
            }
        }
    }

    if found == 0 {
        anyhow::bail!("None of the {} configured agent(s) responded", addresses.len());
    }
    Ok(())
}

fn fail_on_missing(config: &Config, mode: RunMode) -> Result<()> {
    let missing = config.missing_settings(mode);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Missing required settings: {}", missing.join(", ")))
    }
}

async fn bind_agent(host: &str, port: u16) -> Result<TcpListener> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind agent to {addr}"))
}

/// The externally reachable base URL this agent advertises on its card.
fn agent_base_url(listener: &TcpListener) -> Result<String> {
    Ok(format!("http://{}", listener.local_addr()?))
}
