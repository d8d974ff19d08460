//! Axum router configuration for the chat API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{chat, health, list_tools, AppState};

/// Create the API router.
///
/// # Routes
///
/// - `POST /api/chat` - Run one conversation turn
/// - `GET /api/tools` - List the tool catalog
/// - `GET /api/health` - Model backend health
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/tools", get(list_tools))
        .route("/api/health", get(health))
        .with_state(state)
}
