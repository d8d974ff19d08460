//! Fuzzy file resolution against a configured data directory.
//!
//! Users refer to files the way they talk about them ("sales", "sales.xlsx",
//! "/tmp/sales.csv"); this adapter turns those references into real paths.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ports::{FileResolver, ResolveError};

/// Extensions tried, in priority order, when the reference has none.
const SEARCH_EXTENSIONS: &[&str] = &["hyper", "xlsx", "xls", "csv", "xlsm", "xlsb"];

/// Maximum number of candidate names listed in a not-found error.
const MAX_CANDIDATES: usize = 10;

/// Resolves loose file references inside a single directory.
pub struct DirectoryFileResolver {
    directory: PathBuf,
}

impl DirectoryFileResolver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Lists file names in the directory, capped, for error messages.
    fn candidates(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names.truncate(MAX_CANDIDATES);
        names
    }

    /// First directory entry whose name matches `<stem>.<anything>`.
    fn match_by_stem(&self, stem: &str) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.directory).ok()?;
        let prefix = format!("{}.", stem);
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        matches.sort();
        matches.into_iter().next()
    }
}

impl FileResolver for DirectoryFileResolver {
    fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
        let given = Path::new(reference);

        // Absolute path that exists wins outright; an absolute path that
        // does not exist falls back to searching by its file name.
        let name = if given.is_absolute() {
            if given.exists() {
                return Ok(given.to_path_buf());
            }
            given
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(reference)
                .to_string()
        } else {
            reference.to_string()
        };

        if !self.directory.is_dir() {
            return Err(ResolveError::DirectoryNotFound(
                self.directory.display().to_string(),
            ));
        }

        let exact = self.directory.join(&name);
        if exact.exists() {
            debug!(path = %exact.display(), "Resolved file by exact name");
            return Ok(exact);
        }

        let has_extension = Path::new(&name).extension().is_some();
        if !has_extension {
            for ext in SEARCH_EXTENSIONS {
                let candidate = self.directory.join(format!("{}.{}", name, ext));
                if candidate.exists() {
                    debug!(path = %candidate.display(), "Resolved file by extension search");
                    return Ok(candidate);
                }
            }
            if let Some(found) = self.match_by_stem(&name) {
                debug!(path = %found.display(), "Resolved file by stem match");
                return Ok(found);
            }
        }

        Err(ResolveError::NotFound {
            path: exact.display().to_string(),
            candidates: self.candidates(),
        })
    }
}
