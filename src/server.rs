use anyhow::{anyhow, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::ChatError;
use crate::markdown::render_markdown;
use crate::rag::{ChatRequest, ChatResponse, RagEngine};

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// State shared by every handler
pub struct AppState {
    pub engine: RagEngine,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/render", post(render))
        .with_state(state)
}

/// Serve the application on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let result = match payload {
        Ok(Json(request)) => state.engine.answer(&request.messages).await,
        Err(rejection) => Err(ChatError::Internal(anyhow!(
            "invalid chat request: {}",
            rejection.body_text()
        ))),
    };

    result
        .map(|output| Json(ChatResponse { output }))
        .inspect_err(|e| error!("Chat API error: {}", e))
}

async fn render(Json(request): Json<RenderRequest>) -> Json<RenderResponse> {
    Json(RenderResponse {
        html: render_markdown(&request.markdown),
    })
}
