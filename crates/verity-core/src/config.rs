//! Verification configuration
//!
//! Loaded once at process start from JSON, YAML or TOML and read-only
//! afterwards. Components take an `Arc<VerificationConfig>`; [`install`] and
//! [`global`] provide the process-wide instance for binaries that want one.

use crate::error::ConfigError;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use verity_ground::CheckLimits;

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/verity.json";

static GLOBAL: OnceCell<Arc<VerificationConfig>> = OnceCell::new();

/// Verification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Reject structural checks against files without a grammar
    pub strict_mode: bool,
    /// Peer reports that must confirm a claim for cross-validation
    pub minimum_verification_sources: usize,
    /// Any unverified claim fails the report
    pub fail_on_unverified_claims: bool,
    /// Minimum confidence for a `verified` status
    pub confidence_threshold: f64,
    /// Consult peer reports for free-text claims ground truth cannot confirm
    pub cross_validation_required: bool,
    /// Below this confidence, reports with unverified claims ask the user
    pub user_confirmation_threshold: f64,
    /// Assumption warnings carry no confidence penalty
    pub allow_assumptions: bool,
    /// Confidence penalty per warning
    pub warning_penalty: f64,
    /// Per-check timeout in milliseconds
    pub check_timeout_ms: u64,
    /// Largest file a check will read, in bytes
    pub max_file_size: u64,
    /// Number of cached source outlines
    pub outline_cache_capacity: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            strict_mode: true,
            minimum_verification_sources: 2,
            fail_on_unverified_claims: true,
            confidence_threshold: 0.95,
            cross_validation_required: true,
            user_confirmation_threshold: 0.8,
            allow_assumptions: false,
            warning_penalty: 0.1,
            check_timeout_ms: 5_000,
            max_file_size: verity_ground::DEFAULT_MAX_FILE_SIZE,
            outline_cache_capacity: verity_ground::DEFAULT_OUTLINE_CACHE_CAPACITY,
        }
    }
}

impl VerificationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With strict mode
    #[inline]
    #[must_use]
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// With cross-validation threshold
    #[inline]
    #[must_use]
    pub fn with_minimum_sources(mut self, sources: usize) -> Self {
        self.minimum_verification_sources = sources;
        self
    }

    /// With fail-on-unverified policy
    #[inline]
    #[must_use]
    pub fn with_fail_on_unverified(mut self, fail: bool) -> Self {
        self.fail_on_unverified_claims = fail;
        self
    }

    /// With confidence threshold
    #[inline]
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// With cross-validation for free-text claims
    #[inline]
    #[must_use]
    pub fn with_cross_validation(mut self, required: bool) -> Self {
        self.cross_validation_required = required;
        self
    }

    /// With assumption warnings exempt from the penalty
    #[inline]
    #[must_use]
    pub fn with_allow_assumptions(mut self, allow: bool) -> Self {
        self.allow_assumptions = allow;
        self
    }

    /// With per-warning penalty
    #[inline]
    #[must_use]
    pub fn with_warning_penalty(mut self, penalty: f64) -> Self {
        self.warning_penalty = penalty;
        self
    }

    /// With per-check timeout
    #[inline]
    #[must_use]
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Per-check timeout
    #[inline]
    #[must_use]
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    /// Bounds for ground-truth checks
    #[inline]
    #[must_use]
    pub fn check_limits(&self) -> CheckLimits {
        CheckLimits::new(self.check_timeout(), self.max_file_size)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first out-of-range key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_verification_sources < 1 {
            return Err(ConfigError::invalid(
                "minimum_verification_sources",
                "must be at least 1",
            ));
        }
        unit_interval("confidence_threshold", self.confidence_threshold)?;
        unit_interval("user_confirmation_threshold", self.user_confirmation_threshold)?;
        if !self.warning_penalty.is_finite() || self.warning_penalty < 0.0 {
            return Err(ConfigError::invalid(
                "warning_penalty",
                format!("must be a non-negative number, got {}", self.warning_penalty),
            ));
        }
        if self.check_timeout_ms == 0 {
            return Err(ConfigError::invalid("check_timeout_ms", "must be at least 1"));
        }
        if self.outline_cache_capacity == 0 {
            return Err(ConfigError::invalid("outline_cache_capacity", "must be at least 1"));
        }
        Ok(())
    }

    /// Decode a config document by file extension and validate it
    ///
    /// `.yaml`/`.yml` and `.toml` select those formats; anything else is JSON.
    /// Keys that are absent take their defaults; unknown keys are ignored.
    ///
    /// # Errors
    /// Returns error if the file is unreadable, malformed or out of range
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config: Self = match ext.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?,
            Some("toml") => toml::from_str(&text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            _ => serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded verification config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    ///
    /// # Errors
    /// Returns error if the file exists but is unreadable, malformed or out of range
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

/// Install the process-wide configuration
///
/// # Errors
/// Returns [`ConfigError::AlreadyInitialized`] on any call after the first
/// successful one, and a validation error for an out-of-range config.
pub fn install(config: VerificationConfig) -> Result<Arc<VerificationConfig>, ConfigError> {
    config.validate()?;
    let config = Arc::new(config);
    GLOBAL
        .set(Arc::clone(&config))
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(config)
}

/// The installed process-wide configuration, if any
#[must_use]
pub fn global() -> Option<Arc<VerificationConfig>> {
    GLOBAL.get().cloned()
}
