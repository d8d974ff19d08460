//! File resolver port - locating dataset files from loose user input.
//!
//! The chat model is told to pass bare filenames; resolution against the
//! configured directory is a fixed, bounded algorithm (see the files
//! adapter), not an open-ended search.

use std::path::PathBuf;
use thiserror::Error;

/// Port for resolving a possibly-extensionless, possibly-relative filename
/// to an existing file on disk.
pub trait FileResolver: Send + Sync {
    /// Resolves `name` to an existing file path.
    fn resolve(&self, name: &str) -> Result<PathBuf, ResolveError>;
}

/// Errors from file resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No file matched; `candidates` lists nearby files to help the user.
    #[error("file not found: {path}{}", format_candidates(.candidates))]
    NotFound {
        /// The path that was searched for.
        path: String,
        /// Up to ten files present in the searched directory.
        candidates: Vec<String>,
    },

    /// The search directory itself does not exist.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),
}

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    let listing: Vec<String> = candidates.iter().map(|c| format!("  - {}", c)).collect();
    format!("\nAvailable files:\n{}", listing.join("\n"))
}
