//! Error types for ground-truth checks
//!
//! These errors never cross the public boolean checks: every verifier maps a
//! [`GroundError`] to "not verified". They are exposed for callers that want
//! the reason, e.g. [`crate::SourceStructureVerifier::outline`].

use std::path::PathBuf;
use std::time::Duration;

/// Errors while reading or parsing a file
#[derive(Debug, Clone, thiserror::Error)]
pub enum GroundError {
    /// IO error during file access
    #[error("io error reading {path}: {message}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error text
        message: String,
    },

    /// File exceeds the configured size limit
    #[error("file too large: {path} is {size} bytes (max: {max})")]
    TooLarge {
        /// Offending path
        path: PathBuf,
        /// Actual size
        size: u64,
        /// Configured limit
        max: u64,
    },

    /// No structural grammar for this file
    #[error("no grammar for file: {0}")]
    UnsupportedLanguage(PathBuf),

    /// Grammar could not be loaded
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Source does not parse cleanly
    #[error("syntax error in {path} at {line}:{column}")]
    Syntax {
        /// Offending path
        path: PathBuf,
        /// 1-based line of the first error node
        line: usize,
        /// 1-based column of the first error node
        column: usize,
    },

    /// Check did not finish in time
    #[error("check of {path} timed out after {elapsed:?}")]
    Timeout {
        /// Offending path
        path: PathBuf,
        /// Configured timeout
        elapsed: Duration,
    },
}

impl GroundError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create timeout error for path
    pub fn timeout(path: impl Into<PathBuf>, elapsed: Duration) -> Self {
        Self::Timeout {
            path: path.into(),
            elapsed,
        }
    }
}

/// Result type alias for ground-truth operations
pub type GroundResult<T> = Result<T, GroundError>;
