//! Extract converter port - tabular file to columnar extract conversion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Details of a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Source file that was read
    pub input_file: PathBuf,
    /// Extract file that was written
    pub output_file: PathBuf,
    /// Number of data rows
    pub rows: usize,
    /// Number of columns
    pub columns: usize,
    /// Column names in source order
    pub column_names: Vec<String>,
}

/// Port for converting spreadsheet/CSV files into a columnar extract.
#[async_trait]
pub trait ExtractConverter: Send + Sync {
    /// Converts `source` into an extract file.
    ///
    /// When `output` is `None` the extract is written next to the source,
    /// with the same stem and a `.hyper` extension.
    async fn convert(
        &self,
        source: &Path,
        output: Option<&Path>,
    ) -> Result<ConversionReport, ConvertError>;
}

/// Errors from extract conversion.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// Source file is missing.
    #[error("source file not found: {0}")]
    SourceNotFound(String),

    /// Source extension is not a convertible tabular format.
    #[error("unsupported file format: {0}. Supported formats: .xlsx, .xls, .xlsm, .xlsb, .csv")]
    UnsupportedFormat(String),

    /// Failed to read or parse the source file.
    #[error("failed to read source file: {0}")]
    Read(String),

    /// Failed to write the extract file.
    #[error("failed to write extract: {0}")]
    Write(String),
}

impl ConvertError {
    /// Creates a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Creates a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }
}
