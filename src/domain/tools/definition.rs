//! Tool definition - schema and metadata for a tool.
//!
//! Defines the interface of an operation the chat model can invoke.

use serde::{Deserialize, Serialize};

/// Definition of a tool exposed to the chat model.
///
/// Carries the JSON Schema used both for prompting the model and for
/// validating model-supplied arguments before dispatch.
///
/// # Examples
///
/// ```
/// use tableau_assistant::domain::tools::ToolDefinition;
///
/// let definition = ToolDefinition::new(
///     "check_dataset",
///     "Check if a dataset exists in Tableau Server",
///     serde_json::json!({
///         "type": "object",
///         "required": ["dataset_name"],
///         "properties": {
///             "dataset_name": { "type": "string", "description": "Name of the dataset" }
///         }
///     }),
/// );
/// assert_eq!(definition.required_parameters(), vec!["dataset_name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (registry key)
    name: String,

    /// Human-readable description guiding model selection
    description: String,

    /// JSON Schema for the arguments
    parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters schema.
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Returns the names the schema marks as required, in schema order.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }

    /// Converts to Ollama's function-calling format.
    ///
    /// Ollama uses the OpenAI tool structure.
    pub fn to_ollama_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}
