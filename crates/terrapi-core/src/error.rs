//! Scaffold error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for scaffold operations.
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Errors that can occur while resolving, rendering, or writing a project.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A required template subtree or file is missing.
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The destination exists and overwriting was not permitted.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The requested project name or path cannot be used.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A template referenced a missing context key or failed to parse.
    #[error("failed to render {template}: {message} (in `{expression}`)")]
    Render {
        template: String,
        expression: String,
        message: String,
    },

    /// Filesystem error.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScaffoldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts an entire assemble call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::InvalidTarget(_)
        )
    }
}
