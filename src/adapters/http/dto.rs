//! Request/response DTOs for the chat API.

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;

/// POST /api/chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Model override for this turn.
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /api/chat success response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Assistant reply text.
    pub message: String,
    /// Always "assistant".
    pub role: &'static str,
    /// Tool rounds executed while answering.
    pub iterations: usize,
}

/// Error body for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// GET /api/tools response.
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// One entry of the tool catalog.
#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// GET /api/health response when the model backend is reachable.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ollama_running: bool,
    pub current_model: String,
    pub available_models: Vec<String>,
    pub tools_count: usize,
}

/// GET /api/health response when the model backend is down.
#[derive(Debug, Serialize)]
pub struct UnhealthyResponse {
    pub status: &'static str,
    pub ollama_running: bool,
    pub error: String,
}
