//! Stats Pipeline Error Types
//!
//! Error types for snapshot resolution, content measurement and cache persistence.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while gathering, caching or rendering yearly stats
#[derive(Debug, Error)]
pub enum StatsError {
    /// The requested year predates the repository history on the main line
    #[error("No commit exists on '{branch}' before the end of {year}\n\nThe repository history starts after this year. Request a later year or check the --branch option.")]
    NoCommitFound { year: i32, branch: String },

    /// A content file is not valid UTF-8
    #[error("Content file is not valid UTF-8: {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The persisted cache exists but cannot be parsed
    #[error("Stats cache is corrupt: {}\n\nFix or remove the file; it will not be treated as empty.", .path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configured content root does not name a directory inside the repository
    #[error("Invalid content root '{}': {reason}", .root.display())]
    InvalidRoot { root: PathBuf, reason: String },

    /// A libgit2 operation failed
    #[error("Git operation '{operation}' failed{}: {source}", .year.map(|y| format!(" for year {y}")).unwrap_or_default())]
    Git {
        operation: String,
        year: Option<i32>,
        #[source]
        source: git2::Error,
    },

    /// No main line branch could be found
    #[error("Branch '{branch}' not found in repository")]
    BranchNotFound { branch: String },

    /// Filesystem error with the path involved
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External analytics file could not be read or parsed
    #[error("Analytics input problem: {0}")]
    Analytics(String),

    /// Chart rendering failed
    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl StatsError {
    /// Create a git error for an operation not tied to a particular year
    pub fn git(operation: impl Into<String>, source: git2::Error) -> Self {
        Self::Git { operation: operation.into(), year: None, source }
    }

    /// Create a git error carrying the year being gathered
    pub fn git_for_year(operation: impl Into<String>, year: i32, source: git2::Error) -> Self {
        Self::Git { operation: operation.into(), year: Some(year), source }
    }

    /// Create an I/O error for a specific path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn invalid_root(root: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot { root: root.as_ref().to_path_buf(), reason: reason.into() }
    }

    pub fn chart(msg: impl Into<String>) -> Self {
        Self::Chart(msg.into())
    }

    pub fn analytics(msg: impl Into<String>) -> Self {
        Self::Analytics(msg.into())
    }
}

/// Result type for stats pipeline operations
pub type StatsResult<T> = Result<T, StatsError>;
