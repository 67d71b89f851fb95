//! A2A server — serves an agent's card and task endpoints
//!
//! Any [`TaskExecutor`] can be exposed as an A2A agent: the harness serves
//! the capability card at the well-known path, single round-trip tasks, and
//! the SSE streaming route.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use chrono::Utc;
use futures_util::Stream;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt as _, wrappers::ReceiverStream};
use tracing::{info, warn};

use crate::protocol::{
    AGENT_CARD_PATH, AgentCard, StreamEvent, TASKS_PATH, TASKS_STREAM_PATH, TaskResponse,
    TaskSendParams, TaskStatus,
};

/// The behavior an agent exposes over A2A
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Handle a task in one round trip
    async fn execute(&self, message: &str, session_id: &str) -> Result<String>;

    /// Handle a task as a stream of frames.
    ///
    /// The default implementation runs [`execute`](Self::execute) and
    /// replays the result as a delta followed by a done frame, so agents
    /// that produce a single blob still serve the streaming route.
    async fn stream(&self, message: &str, session_id: &str) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(16);
        match self.execute(message, session_id).await {
            Ok(text) => {
                let _ = tx.send(StreamEvent::Delta { text }).await;
                let _ = tx
                    .send(StreamEvent::Done {
                        status: TaskStatus::Completed,
                    })
                    .await;
            }
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Status {
                        status: TaskStatus::Failed,
                        message: Some(e.to_string()),
                    })
                    .await;
                let _ = tx
                    .send(StreamEvent::Done {
                        status: TaskStatus::Failed,
                    })
                    .await;
            }
        }
        rx
    }
}

struct ServerState {
    card: AgentCard,
    executor: Arc<dyn TaskExecutor>,
}

/// Serves one agent behind the A2A routes
#[derive(Clone)]
pub struct A2aServer {
    state: Arc<ServerState>,
}

impl A2aServer {
    pub fn new(card: AgentCard, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            state: Arc::new(ServerState { card, executor }),
        }
    }

    /// Build the axum application
    pub fn app(&self) -> Router {
        Router::new()
            .route(AGENT_CARD_PATH, get(get_card))
            .route(TASKS_PATH, post(post_task))
            .route(TASKS_STREAM_PATH, post(post_task_stream))
            .with_state(self.state.clone())
    }

    /// Serve until the listener closes
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!(
            "A2A agent '{}' listening on {}",
            self.state.card.name,
            listener.local_addr()?
        );
        axum::serve(listener, self.app()).await?;
        Ok(())
    }
}

async fn get_card(State(state): State<Arc<ServerState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn post_task(
    State(state): State<Arc<ServerState>>,
    Json(params): Json<TaskSendParams>,
) -> Json<TaskResponse> {
    let created_at = Utc::now();
    info!("Task {} received (session {})", params.id, params.session_id);

    let (status, result) = match state
        .executor
        .execute(&params.message, &params.session_id)
        .await
    {
        Ok(text) => (TaskStatus::Completed, Some(text)),
        Err(e) => {
            warn!("Task {} failed: {:#}", params.id, e);
            (TaskStatus::Failed, Some(e.to_string()))
        }
    };

    Json(TaskResponse {
        id: params.id,
        session_id: params.session_id,
        status,
        result,
        created_at,
        completed_at: Some(Utc::now()),
    })
}

async fn post_task_stream(
    State(state): State<Arc<ServerState>>,
    Json(params): Json<TaskSendParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "Task {} stream opened (session {})",
        params.id, params.session_id
    );

    let rx = state
        .executor
        .stream(&params.message, &params.session_id)
        .await;

    let stream = ReceiverStream::new(rx).map(|frame| {
        let event = Event::default()
            .json_data(&frame)
            .unwrap_or_else(|_| Event::default().data("{\"kind\":\"unknown\"}"));
        Ok::<_, Infallible>(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
