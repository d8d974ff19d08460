//! Tool registry - catalog of the operations exposed to the chat model.
//!
//! The registry is constructed once at startup and read-only afterwards.
//! [`ToolRegistry::standard`] builds the canonical Tableau catalog.

use super::ToolDefinition;

/// Tool name: upload a dataset file to Tableau Server.
pub const UPLOAD_DATASET: &str = "upload_dataset";
/// Tool name: check whether a dataset exists.
pub const CHECK_DATASET: &str = "check_dataset";
/// Tool name: list datasets in a project.
pub const LIST_DATASETS: &str = "list_datasets";
/// Tool name: convert an Excel file to Hyper format.
pub const CONVERT_EXCEL_TO_HYPER: &str = "convert_excel_to_hyper";

/// Read-only, insertion-ordered catalog of tool definitions.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Builds the standard Tableau tool catalog.
    ///
    /// `upload_dataset` deliberately requires `tableau_project`: an
    /// overwrite-mode upload must never target a silently defaulted
    /// project, so the model has to elicit one from the user first.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(ToolDefinition::new(
            UPLOAD_DATASET,
            "Upload a dataset file to Tableau Server. \
             Accepts Excel (.xlsx, .xls), CSV (.csv), or Hyper (.hyper) files. \
             Excel and CSV files are automatically converted to Hyper format before upload. \
             IMPORTANT: Use ONLY the filename, not a full path. \
             Examples: 'sales.xlsx' or 'data.csv' or 'revenue' (extension optional)",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "FILENAME ONLY (not full path). Examples: 'data.csv', 'sales.xlsx', 'revenue'. \
                                        Files are searched in the configured default directory. \
                                        Extension is optional - the system will search for matching files."
                    },
                    "tableau_project": {
                        "type": "string",
                        "description": "Tableau project name where the dataset will be uploaded. \
                                        Required - ask the user if they have not named one."
                    }
                },
                "required": ["file_path", "tableau_project"]
            }),
        ));

        registry.register(ToolDefinition::new(
            CHECK_DATASET,
            "Check if a dataset exists in Tableau Server. \
             Searches for the dataset by name within a specific project. \
             Returns whether the dataset exists and its details if found.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "dataset_name": {
                        "type": "string",
                        "description": "Name of the dataset to check"
                    },
                    "tableau_project": {
                        "type": "string",
                        "description": "Tableau project name to search in. \
                                        Optional - defaults to the configured project."
                    }
                },
                "required": ["dataset_name"]
            }),
        ));

        registry.register(ToolDefinition::new(
            LIST_DATASETS,
            "List all datasets in a Tableau project. \
             Returns name and ID for each dataset found in the project.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "tableau_project": {
                        "type": "string",
                        "description": "Tableau project name to list datasets from. \
                                        Optional - defaults to the configured project."
                    }
                },
                "required": []
            }),
        ));

        registry.register(ToolDefinition::new(
            CONVERT_EXCEL_TO_HYPER,
            "Convert an Excel file to Tableau Hyper format without uploading it. \
             Returns the output file path and row/column counts.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "excel_file_path": {
                        "type": "string",
                        "description": "Excel file to convert. Filename only; extension optional."
                    },
                    "hyper_file_path": {
                        "type": "string",
                        "description": "Output Hyper file path. \
                                        Optional - defaults to the input name with a .hyper extension."
                    }
                },
                "required": ["excel_file_path"]
            }),
        ));

        registry
    }

    /// Registers a tool definition.
    pub fn register(&mut self, definition: ToolDefinition) {
        self.tools.push(definition);
    }

    /// Returns all definitions in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Gets a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Checks if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Converts the catalog to Ollama's function-calling format.
    pub fn to_ollama_tools(&self) -> Vec<serde_json::Value> {
        self.tools.iter().map(|t| t.to_ollama_format()).collect()
    }
}
