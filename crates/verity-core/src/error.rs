//! Error types for Verity Core
//!
//! Verification itself never fails: unverifiable claims end up in the report.
//! The errors here cover what happens before verification can start, chiefly
//! loading and validating configuration.

use std::path::PathBuf;

/// Configuration errors (fatal at startup)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Config path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// Malformed YAML
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        /// Config path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: serde_yaml::Error,
    },

    /// Malformed TOML
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        /// Config path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The process-wide configuration was already installed
    #[error("configuration already initialized")]
    AlreadyInitialized,
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create range error for a key
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Main Verity error type
#[derive(Debug, thiserror::Error)]
pub enum VerityError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report or output document could not be decoded or encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Verity operations
pub type Result<T> = std::result::Result<T, VerityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_display() {
        let err = ConfigError::invalid("confidence_threshold", "must be within [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "invalid value for confidence_threshold: must be within [0, 1], got 1.5"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: VerityError = ConfigError::AlreadyInitialized.into();
        assert!(matches!(err, VerityError::Config(ConfigError::AlreadyInitialized)));
        assert_eq!(err.to_string(), "configuration error: configuration already initialized");
    }
}
