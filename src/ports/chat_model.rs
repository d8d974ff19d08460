//! Chat model port - interface to the tool-calling LLM backend.
//!
//! The orchestrator drives this port; failures here propagate to the HTTP
//! facade rather than being folded into the conversation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::ChatMessage;

/// Port for a chat-completion backend with function/tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Requests one completion over the full conversation, with the tool
    /// catalog exposed in the backend's function-calling format.
    ///
    /// Returns the assistant message, which may carry pending tool calls.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<ChatMessage, ChatModelError>;

    /// Lists the models available on the backend.
    async fn list_models(&self) -> Result<Vec<String>, ChatModelError>;
}

/// Errors from the chat backend.
#[derive(Debug, Clone, Error)]
pub enum ChatModelError {
    /// Backend is not reachable.
    #[error("chat backend unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Request timed out.
    #[error("chat request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Backend returned a non-success status.
    #[error("chat backend error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Failed to parse the backend response.
    #[error("failed to parse chat response: {0}")]
    Parse(String),

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),
}

impl ChatModelError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}
