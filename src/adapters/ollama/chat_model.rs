//! Ollama chat client - implementation of ChatModel over the local Ollama API.
//!
//! Talks to Ollama's `/api/chat` endpoint with `stream: false` and passes the
//! tool catalog through on every call so the model can request tool calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OllamaConfig;
use crate::domain::chat::{ChatMessage, MessageRole, ToolCall};
use crate::ports::{ChatModel, ChatModelError};

/// Ollama API client implementing the chat-model port.
pub struct OllamaChatModel {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaChatModel {
    /// Creates a client from the Ollama section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: &OllamaConfig) -> Result<Self, ChatModelError> {
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatModelError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ChatModelError {
        if e.is_timeout() {
            ChatModelError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ChatModelError::unavailable(format!(
                "Cannot reach Ollama at {}: {}",
                self.base_url, e
            ))
        } else {
            ChatModelError::network(e.to_string())
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response, ChatModelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChatModelError::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<ChatMessage, ChatModelError> {
        let request = WireChatRequest {
            model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools,
            stream: false,
        };

        debug!(model, messages = messages.len(), "Sending chat request to Ollama");

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response).await?;

        let body: WireChatResponse = response
            .json()
            .await
            .map_err(|e| ChatModelError::parse(format!("Invalid chat response: {}", e)))?;

        Ok(body.message.into_chat_message())
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatModelError> {
        let response = self
            .client
            .get(self.tags_url())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response).await?;

        let body: WireTagsResponse = response
            .json()
            .await
            .map_err(|e| ChatModelError::parse(format!("Invalid tags response: {}", e)))?;

        Ok(body.models.into_iter().map(|m| m.name).collect())
    }
}

// ----- Ollama API Types -----

#[derive(Debug, Serialize)]
struct WireChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [serde_json::Value],
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        Self {
            role: role.to_string(),
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    function: WireFunctionCall {
                        name: call.name().to_string(),
                        arguments: call.arguments().clone(),
                    },
                })
                .collect(),
        }
    }
}

impl WireMessage {
    fn into_chat_message(self) -> ChatMessage {
        let calls: Vec<ToolCall> = self
            .tool_calls
            .into_iter()
            .map(|c| ToolCall::new(c.function.name, c.function.arguments))
            .collect();
        if calls.is_empty() {
            ChatMessage::assistant(self.content)
        } else {
            ChatMessage::assistant_with_tool_calls(self.content, calls)
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireTagsResponse {
    #[serde(default)]
    models: Vec<WireModel>,
}

#[derive(Debug, Deserialize)]
struct WireModel {
    name: String,
}
