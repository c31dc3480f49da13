//! HTTP boundary: `POST /ask` and `GET /health`.

pub mod cors;
pub mod error;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::client::{Answerer, answer_text};
use crate::interaction_log::InteractionLog;

pub use cors::CorsPolicy;
pub use error::ApiError;

pub const SERVICE_TITLE: &str = "AI Assistant";

#[derive(Clone)]
pub struct AppState {
    answerer: Arc<dyn Answerer>,
    log: Arc<InteractionLog>,
    cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(answerer: Arc<dyn Answerer>, log: Arc<InteractionLog>, cors: CorsPolicy) -> Self {
        Self {
            answerer,
            log,
            cors: Arc::new(cors),
        }
    }

    async fn record(&self, question: String, answer: String) {
        let log = Arc::clone(&self.log);
        let outcome = tokio::task::spawn_blocking(move || log.record(&question, &answer)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(
                path = %self.log.path().display(),
                error = %err,
                "failed to append interaction record"
            ),
            Err(err) => warn!(error = %err, "interaction record task did not complete"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        debug!("rejected empty question");
        return Err(ApiError::EmptyQuestion);
    }

    // Relay failures stay on the 200 path; callers check the `[ERROR]` prefix.
    let result = state.answerer.ask(question).await;
    if let Err(err) = &result {
        warn!(kind = err.kind_str(), error = %err, "question relay failed");
    }
    let answer = answer_text(result);
    state.record(question.to_string(), answer.clone()).await;

    Ok(Json(AnswerResponse { answer }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "API is running",
    })
}

pub fn router(state: AppState) -> Router {
    let policy = Arc::clone(&state.cors);
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(policy, cors::apply))
        .with_state(state)
}

/// Serves on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!(title = SERVICE_TITLE, addr = %addr, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

pub async fn run(bind_addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    serve(listener, state, shutdown_signal()).await?;
    info!("http server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
