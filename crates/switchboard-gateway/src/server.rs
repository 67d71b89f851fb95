//! Gateway HTTP server
//!
//! Three routes: `POST /chat` for turns, `GET /healthz` for probes,
//! `GET /agents` for the discovered directory. The chat route always
//! returns 200 with reply text; the shutdown path runs router cleanup
//! before the process exits.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::Json;
use axum::extract::State;
use axum::routing::{get, post};
use switchboard_router::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::protocol::{AgentSummary, ChatRequest, ChatResponse, HealthResponse};

/// Reply for a blank chat message; the router is never invoked for one.
const EMPTY_MESSAGE_REPLY: &str = "Please enter a message.";

pub struct GatewayServer {
    router: Arc<Router>,
}

impl GatewayServer {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// Build the axum application
    pub fn app(&self) -> axum::Router {
        axum::Router::new()
            .route("/chat", post(post_chat))
            .route("/healthz", get(get_healthz))
            .route("/agents", get(get_agents))
            .layer(CorsLayer::permissive())
            .with_state(self.router.clone())
    }

    /// Serve until ctrl-c, then run router cleanup.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve until `shutdown` resolves, then run router cleanup.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        info!("Gateway listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway shutting down");
        self.router.cleanup().await;
        Ok(())
    }
}

async fn post_chat(
    State(router): State<Arc<Router>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = router.session_id().await;

    if request.message.trim().is_empty() {
        return Json(ChatResponse {
            reply: EMPTY_MESSAGE_REPLY.to_string(),
            session_id,
        });
    }

    let reply = match router.handle_message(&request.message).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Turn failed: {}", e);
            e.user_message()
        }
    };

    Json(ChatResponse { reply, session_id })
}

async fn get_healthz(State(router): State<Arc<Router>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agents: router.registry().len(),
        state: router.state().name().to_string(),
    })
}

async fn get_agents(State(router): State<Arc<Router>>) -> Json<Vec<AgentSummary>> {
    let summaries = router
        .registry()
        .cards()
        .iter()
        .map(|card| AgentSummary::from_card(card))
        .collect();
    Json(summaries)
}
