//! Dataset service port - interface to the Tableau Server datasource API.
//!
//! Implementations must acquire a fresh authenticated session per operation
//! and release it (sign out) on every exit path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Information about a published Tableau dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Dataset name
    pub name: String,
    /// Dataset ID
    pub id: String,
    /// Owning project ID
    pub project_id: String,
    /// Source file path, when the dataset was just uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Result of a dataset existence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCheck {
    /// Whether the dataset exists in the project
    pub exists: bool,
    /// Dataset name that was checked
    pub name: String,
    /// Dataset ID, when it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Project ID, when it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Project name that was searched, when the dataset is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl DatasetCheck {
    /// Builds a positive check result.
    pub fn found(name: impl Into<String>, id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            exists: true,
            name: name.into(),
            id: Some(id.into()),
            project_id: Some(project_id.into()),
            project: None,
        }
    }

    /// Builds a negative check result.
    pub fn missing(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            exists: false,
            name: name.into(),
            id: None,
            project_id: None,
            project: Some(project.into()),
        }
    }
}

/// Port for Tableau Server dataset operations.
#[async_trait]
pub trait DatasetService: Send + Sync {
    /// Publishes a dataset file to the named project in overwrite mode.
    async fn upload(&self, file: &Path, project: &str) -> Result<DatasetInfo, DatasetServiceError>;

    /// Checks whether a dataset with this name exists in the project.
    async fn check(&self, name: &str, project: &str) -> Result<DatasetCheck, DatasetServiceError>;

    /// Lists all datasets in the project.
    async fn list(&self, project: &str) -> Result<Vec<DatasetInfo>, DatasetServiceError>;
}

/// Errors from the Tableau Server API.
#[derive(Debug, Clone, Error)]
pub enum DatasetServiceError {
    /// PAT sign-in was rejected.
    #[error("Tableau authentication failed")]
    AuthenticationFailed,

    /// The named project does not exist on the server.
    #[error("Project '{0}' not found on Tableau Server")]
    ProjectNotFound(String),

    /// Dataset file is missing on disk.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Server returned a non-success status.
    #[error("Tableau Server error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Failed to parse a server response.
    #[error("failed to parse Tableau response: {0}")]
    Parse(String),

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),
}

impl DatasetServiceError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}
