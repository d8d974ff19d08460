//! Configuration error types

use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse configuration sources
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors from semantic validation of configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Port must be non-zero
    #[error("server port must be non-zero")]
    InvalidPort,

    /// Timeout outside the accepted range
    #[error("timeout must be between 1 and 600 seconds")]
    InvalidTimeout,

    /// A URL field is not a valid http(s) URL
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    /// A required field is empty
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}
