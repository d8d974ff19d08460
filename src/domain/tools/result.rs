//! Tool execution result envelope.
//!
//! Every tool execution is normalized into this envelope before it is fed
//! back to the chat model; the `status` field is the discriminator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a tool execution, serialized to the model as a flat JSON
/// object with a `status` discriminator.
///
/// # Examples
///
/// ```
/// use tableau_assistant::domain::tools::ToolResult;
///
/// let result = ToolResult::error("upload_dataset", "File not found");
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["status"], "error");
/// assert_eq!(json["action"], "upload_dataset");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult {
    /// Tool executed successfully
    Success {
        /// Name of the executed tool
        action: String,
        /// Tool-specific result data
        result: Map<String, Value>,
    },

    /// Tool failed; the conversation continues with this message
    Error {
        /// Name of the attempted tool
        action: String,
        /// Human-readable failure description
        message: String,
    },
}

impl ToolResult {
    /// Creates a success result.
    pub fn success(action: impl Into<String>, result: Map<String, Value>) -> Self {
        Self::Success {
            action: action.into(),
            result,
        }
    }

    /// Creates an error result.
    pub fn error(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Returns true for success results.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the tool name this result belongs to.
    pub fn action(&self) -> &str {
        match self {
            Self::Success { action, .. } | Self::Error { action, .. } => action,
        }
    }

    /// Serializes the result for a tool-role message.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","message":"failed to serialize tool result"}"#.to_string()
        })
    }
}
