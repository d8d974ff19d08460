//! HTTP handlers for the chat API.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{error, info};

use crate::application::ChatOrchestrator;
use crate::domain::chat::ChatMessage;
use crate::domain::tools::ToolRegistry;
use crate::ports::ChatModel;

use super::dto::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, ToolDescriptor, ToolsResponse,
    UnhealthyResponse,
};

/// Instructions sent as the system message on every turn.
pub const SYSTEM_PROMPT: &str = "You are a helpful Tableau Server assistant. \
You can upload datasets to Tableau Server, check whether a dataset exists, \
list the datasets in a project, and convert Excel files to Hyper extracts. \
Use the available tools to carry out the user's request, then summarize what \
happened in plain language. When uploading, always confirm which Tableau \
project the user wants. Refer to files by the name the user gave; the server \
resolves them against its data directory.";

/// Shared state for the chat API.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub registry: Arc<ToolRegistry>,
    pub model: Arc<dyn ChatModel>,
}

/// Handle one conversation turn.
///
/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(messages = request.messages.len(), "Chat request received");

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(request.messages);

    match state
        .orchestrator
        .run_with_model(messages, request.model.as_deref())
        .await
    {
        Ok(outcome) => {
            info!(iterations = outcome.iterations, truncated = outcome.truncated, "Chat turn complete");
            Ok(Json(ChatResponse {
                message: outcome.message,
                role: "assistant",
                iterations: outcome.iterations,
            }))
        }
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            ))
        }
    }
}

/// List the tool catalog.
///
/// GET /api/tools
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let tools = state
        .registry
        .definitions()
        .iter()
        .map(|definition| ToolDescriptor {
            name: definition.name().to_string(),
            description: definition.description().to_string(),
            parameters: definition.parameters().clone(),
        })
        .collect();
    Json(ToolsResponse { tools })
}

/// Report whether the model backend is reachable.
///
/// GET /api/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.model.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                ollama_running: true,
                current_model: state.orchestrator.model_name().to_string(),
                available_models: models,
                tools_count: state.registry.len(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(UnhealthyResponse {
                status: "unhealthy",
                ollama_running: false,
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
