//! Tool call value object.
//!
//! A tool call is the model's structured request to invoke a registered
//! operation. It exists only within one orchestration round.

use serde::{Deserialize, Serialize};

/// A request, emitted by the chat model, to invoke a tool.
///
/// Arguments are an arbitrary JSON object because each tool declares its
/// own parameter schema.
///
/// # Examples
///
/// ```
/// use tableau_assistant::domain::chat::ToolCall;
///
/// let call = ToolCall::new(
///     "check_dataset",
///     serde_json::json!({ "dataset_name": "revenue" }),
/// );
/// assert_eq!(call.name(), "check_dataset");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    name: String,

    /// Arguments for the tool (JSON object)
    arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a new tool call.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments.
    pub fn arguments(&self) -> &serde_json::Value {
        &self.arguments
    }

    /// Returns a named argument as a string, if present and non-empty.
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}
