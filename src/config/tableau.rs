//! Tableau Server configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for the target Tableau Server
#[derive(Debug, Clone, Deserialize)]
pub struct TableauConfig {
    /// Tableau Server base URL (required)
    pub server_url: String,

    /// Site content URL; empty string targets the default site
    #[serde(default)]
    pub site_id: String,

    /// Personal access token name (required)
    pub pat_name: String,

    /// Personal access token secret (required)
    pub pat_secret: Secret<String>,

    /// Default project for check/list operations
    #[serde(default = "default_project_name")]
    pub project_name: String,
}

impl TableauConfig {
    /// Expose the PAT secret for sign-in requests
    pub fn pat_secret(&self) -> &str {
        self.pat_secret.expose_secret()
    }

    /// Validate Tableau configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl {
                field: "tableau.server_url",
                value: self.server_url.clone(),
            });
        }
        if self.pat_name.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "tableau.pat_name",
            });
        }
        if self.pat_secret().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "tableau.pat_secret",
            });
        }
        if self.project_name.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "tableau.project_name",
            });
        }
        Ok(())
    }
}

fn default_project_name() -> String {
    "Default".to_string()
}
