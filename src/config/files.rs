//! File resolution configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Configuration for locating dataset files on disk
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory searched when a tool names a file without a path
    #[serde(default = "default_directory")]
    pub default_directory: PathBuf,
}

impl FilesConfig {
    /// Validate files configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_directory.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "files.default_directory",
            });
        }
        Ok(())
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            default_directory: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}
