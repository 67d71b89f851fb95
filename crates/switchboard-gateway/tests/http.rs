//! Gateway HTTP tests against a live router and a stub agent

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use switchboard_a2a::{A2aServer, AgentCapabilities, AgentCard, AgentSkill, TaskExecutor};
use switchboard_core::Config;
use switchboard_gateway::{AgentSummary, ChatResponse, GatewayServer, HealthResponse};
use switchboard_router::{Router, RouterState, SENTINEL_NO_REPLY, SkillMatcher};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::sleep;

struct ScoreExecutor;

#[async_trait]
impl TaskExecutor for ScoreExecutor {
    async fn execute(&self, _message: &str, _session_id: &str) -> Result<String> {
        Ok("Pirates 5, Reds 3 (Final)".to_string())
    }
}

async fn spawn_stub_agent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let card = AgentCard {
        name: "sports-results".to_string(),
        description: "Final scores for recent games".to_string(),
        url: base_url.clone(),
        version: "0.1.0".to_string(),
        capabilities: AgentCapabilities { streaming: true },
        default_input_modes: vec!["text".to_string()],
        default_output_modes: vec!["text".to_string()],
        skills: vec![AgentSkill {
            id: "sports-results".to_string(),
            name: "Sports Results".to_string(),
            description: String::new(),
            tags: vec!["mlb".to_string(), "scores".to_string()],
            examples: vec!["Show the score of the Pirates game last night".to_string()],
        }],
    };
    tokio::spawn(A2aServer::new(card, Arc::new(ScoreExecutor)).serve(listener));
    base_url
}

async fn spawn_gateway() -> (String, Arc<Router>, oneshot::Sender<()>) {
    let agent_url = spawn_stub_agent().await;

    let mut config = Config::default();
    config.router.remote_agents = vec![agent_url];
    config.planner.provider = "skills".to_string();
    let router = Arc::new(
        Router::initialize(&config, Arc::new(SkillMatcher::new()))
            .await
            .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = GatewayServer::new(router.clone());
    tokio::spawn(async move {
        server
            .serve_with_shutdown(listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (base_url, router, shutdown_tx)
}

#[tokio::test]
async fn test_healthz_reports_agents_and_state() {
    let (base_url, _router, _shutdown) = spawn_gateway().await;

    let health: HealthResponse = reqwest::get(format!("{base_url}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.agents, 1);
    assert_eq!(health.state, "ready");
}

#[tokio::test]
async fn test_agents_directory_lists_discovered_cards() {
    let (base_url, _router, _shutdown) = spawn_gateway().await;

    let agents: Vec<AgentSummary> = reqwest::get(format!("{base_url}/agents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].name, "sports-results");
    assert!(agents[0].streaming);
    assert_eq!(agents[0].skills[0].tags, vec!["mlb", "scores"]);
}

#[tokio::test]
async fn test_chat_returns_agent_reply() {
    let (base_url, _router, _shutdown) = spawn_gateway().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/chat"))
        .json(&serde_json::json!({"message": "Show score for Pirates game last night"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let chat: ChatResponse = response.json().await.unwrap();
    assert_eq!(chat.reply, "Pirates 5, Reds 3 (Final)");
    assert!(!chat.session_id.is_empty());

    // The session is the router's, stable across turns.
    let second: ChatResponse = client
        .post(format!("{base_url}/chat"))
        .json(&serde_json::json!({"message": "Show score for Pirates game last night"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.session_id, chat.session_id);
}

#[tokio::test]
async fn test_chat_with_unrelated_message_answers_sentinel() {
    let (base_url, _router, _shutdown) = spawn_gateway().await;

    let response = reqwest::Client::new()
        .post(format!("{base_url}/chat"))
        .json(&serde_json::json!({"message": "recommend a pasta recipe"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let chat: ChatResponse = response.json().await.unwrap();
    assert_eq!(chat.reply, SENTINEL_NO_REPLY);
}

#[tokio::test]
async fn test_chat_with_blank_message_prompts_for_input() {
    let (base_url, _router, _shutdown) = spawn_gateway().await;

    let response = reqwest::Client::new()
        .post(format!("{base_url}/chat"))
        .json(&serde_json::json!({"message": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let chat: ChatResponse = response.json().await.unwrap();
    assert_eq!(chat.reply, "Please enter a message.");
}

#[tokio::test]
async fn test_shutdown_runs_router_cleanup() {
    let (base_url, router, shutdown) = spawn_gateway().await;

    // Warm path first so shutdown has state to clear.
    let _: ChatResponse = reqwest::Client::new()
        .post(format!("{base_url}/chat"))
        .json(&serde_json::json!({"message": "Show score for Pirates game last night"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    shutdown.send(()).unwrap();
    for _ in 0..200 {
        if router.state() == RouterState::Closed {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(router.state(), RouterState::Closed);
    assert!(router.history().await.is_empty());
}
