//! Tool executor - validates arguments and dispatches tool calls.
//!
//! This is the system's error-containment boundary: whatever a collaborator
//! does, `execute` returns a [`ToolResult`], never an error, so the
//! conversation loop can always continue.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::tools::{
    ToolRegistry, ToolResult, CHECK_DATASET, CONVERT_EXCEL_TO_HYPER, LIST_DATASETS, UPLOAD_DATASET,
};
use crate::ports::{
    ConvertError, DatasetService, DatasetServiceError, ExtractConverter, FileResolver,
    ResolveError,
};

/// Tool names this executor can dispatch.
///
/// Checked against the registry at construction, so a catalog entry without
/// a handler is a startup error instead of a mid-conversation surprise.
const HANDLED_TOOLS: &[&str] = &[
    UPLOAD_DATASET,
    CHECK_DATASET,
    LIST_DATASETS,
    CONVERT_EXCEL_TO_HYPER,
];

/// Spreadsheet extensions that are auto-converted before upload.
const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb"];

/// Registry/handler mismatch detected at construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("registered tool '{0}' has no executor handler")]
pub struct UnhandledToolError(pub String);

/// Failures inside a single tool dispatch, before normalization into a
/// [`ToolResult`].
#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Dataset(#[from] DatasetServiceError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Unsupported file format: {0}. Supported formats: .hyper, .xlsx, .xls, .csv")]
    UnsupportedFormat(String),
}

/// Validates tool arguments and dispatches to the external collaborators.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    datasets: Arc<dyn DatasetService>,
    converter: Arc<dyn ExtractConverter>,
    resolver: Arc<dyn FileResolver>,
    default_project: String,
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("registry", &self.registry)
            .field("default_project", &self.default_project)
            .finish_non_exhaustive()
    }
}

impl ToolExecutor {
    /// Creates an executor over the given registry and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledToolError`] if the registry contains a tool this
    /// executor has no handler for.
    pub fn new(
        registry: Arc<ToolRegistry>,
        datasets: Arc<dyn DatasetService>,
        converter: Arc<dyn ExtractConverter>,
        resolver: Arc<dyn FileResolver>,
        default_project: impl Into<String>,
    ) -> Result<Self, UnhandledToolError> {
        for definition in registry.definitions() {
            if !HANDLED_TOOLS.contains(&definition.name()) {
                return Err(UnhandledToolError(definition.name().to_string()));
            }
        }
        Ok(Self {
            registry,
            datasets,
            converter,
            resolver,
            default_project: default_project.into(),
        })
    }

    /// Executes a tool call and normalizes the outcome.
    ///
    /// Unknown names, invalid arguments, and collaborator failures all come
    /// back as `ToolResult::Error`; this method never panics and never
    /// returns `Err`.
    pub async fn execute(&self, name: &str, arguments: &Value) -> ToolResult {
        info!(tool = name, "Executing tool");
        debug!(tool = name, ?arguments, "Tool arguments");

        let Some(definition) = self.registry.get(name) else {
            warn!(tool = name, "Model requested a tool that is not registered");
            return ToolResult::error(name, format!("Unknown tool: {}", name));
        };

        if !arguments.is_object() {
            return ToolResult::error(name, "Invalid arguments: expected a JSON object");
        }

        for required in definition.required_parameters() {
            let missing = match arguments.get(required) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if missing {
                return ToolResult::error(
                    name,
                    format!("Missing required parameter: {}", required),
                );
            }
        }

        let outcome = match name {
            UPLOAD_DATASET => self.upload_dataset(arguments).await,
            CHECK_DATASET => self.check_dataset(arguments).await,
            LIST_DATASETS => self.list_datasets(arguments).await,
            CONVERT_EXCEL_TO_HYPER => self.convert_excel_to_hyper(arguments).await,
            // new() guarantees every registered tool matches above
            _ => return ToolResult::error(name, format!("Unknown tool: {}", name)),
        };

        match outcome {
            Ok(result) => ToolResult::success(name, result),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                ToolResult::error(name, e.to_string())
            }
        }
    }

    /// Upload with automatic Excel/CSV to Hyper conversion.
    async fn upload_dataset(&self, arguments: &Value) -> Result<Map<String, Value>, DispatchError> {
        let file_path = string_argument(arguments, "file_path");
        // Mandatory by schema; the configured default project is deliberately
        // not a fallback for overwrite-mode uploads.
        let project = string_argument(arguments, "tableau_project");

        let path = self.resolver.resolve(file_path)?;
        let extension = extension_of(&path);

        let (upload_path, conversion) = match extension.as_str() {
            "hyper" => {
                debug!(path = %path.display(), "Hyper file detected - no conversion needed");
                (path.clone(), None)
            }
            "csv" => {
                info!(path = %path.display(), "CSV file detected - converting to Hyper format");
                let report = self.converter.convert(&path, None).await?;
                (report.output_file.clone(), Some(("CSV", report)))
            }
            ext if EXCEL_EXTENSIONS.contains(&ext) => {
                info!(path = %path.display(), "Excel file detected - converting to Hyper format");
                let report = self.converter.convert(&path, None).await?;
                (report.output_file.clone(), Some(("Excel", report)))
            }
            other => {
                let shown = if other.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", other)
                };
                return Err(DispatchError::UnsupportedFormat(shown));
            }
        };

        let info = self.datasets.upload(&upload_path, project).await?;

        let mut result = to_object(serde_json::to_value(&info));
        if let Some((converted_from, report)) = conversion {
            result.insert(
                "conversion".to_string(),
                serde_json::json!({
                    "converted_from": converted_from,
                    "original_file": path,
                    "rows": report.rows,
                    "columns": report.columns,
                }),
            );
        }
        Ok(result)
    }

    async fn check_dataset(&self, arguments: &Value) -> Result<Map<String, Value>, DispatchError> {
        let dataset_name = string_argument(arguments, "dataset_name");
        let project = self.project_or_default(arguments);

        let check = self.datasets.check(dataset_name, project).await?;
        Ok(to_object(serde_json::to_value(&check)))
    }

    async fn list_datasets(&self, arguments: &Value) -> Result<Map<String, Value>, DispatchError> {
        let project = self.project_or_default(arguments);

        let datasets = self.datasets.list(project).await?;
        let mut result = Map::new();
        result.insert("count".to_string(), Value::from(datasets.len()));
        result.insert(
            "datasets".to_string(),
            serde_json::to_value(&datasets).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        Ok(result)
    }

    async fn convert_excel_to_hyper(
        &self,
        arguments: &Value,
    ) -> Result<Map<String, Value>, DispatchError> {
        let source = string_argument(arguments, "excel_file_path");
        let output = arguments
            .get("hyper_file_path")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let path = self.resolver.resolve(source)?;
        let report = self.converter.convert(&path, output.as_deref()).await?;
        Ok(to_object(serde_json::to_value(&report)))
    }

    fn project_or_default<'a>(&'a self, arguments: &'a Value) -> &'a str {
        arguments
            .get("tableau_project")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_project)
    }
}

/// Reads a string argument that required-parameter validation has already
/// guaranteed to be present.
fn string_argument<'a>(arguments: &'a Value, key: &str) -> &'a str {
    arguments.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn to_object(value: Result<Value, serde_json::Error>) -> Map<String, Value> {
    match value {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
