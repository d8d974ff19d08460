//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the
//! `TABLEAU_ASSISTANT` prefix and `__` as the nesting separator.
//!
//! # Example
//!
//! ```no_run
//! use tableau_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod files;
mod ollama;
mod server;
mod tableau;

pub use error::{ConfigError, ValidationError};
pub use files::FilesConfig;
pub use ollama::OllamaConfig;
pub use server::ServerConfig;
pub use tableau::TableauConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`], which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration (host, port, log level)
    #[serde(default)]
    pub server: ServerConfig,

    /// Ollama chat backend configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Tableau Server connection (PAT credentials)
    pub tableau: TableauConfig,

    /// File resolution configuration
    #[serde(default)]
    pub files: FilesConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads variables with the
    /// `TABLEAU_ASSISTANT` prefix. Nested values use `__`:
    ///
    /// - `TABLEAU_ASSISTANT__SERVER__PORT=8000` -> `server.port`
    /// - `TABLEAU_ASSISTANT__TABLEAU__SERVER_URL=...` -> `tableau.server_url`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TABLEAU_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ollama.validate()?;
        self.tableau.validate()?;
        self.files.validate()?;
        Ok(())
    }
}
