//! Confidence policy
//!
//! Folds claim counts and warnings into a single score in [0, 1]. The default
//! is a linear per-warning penalty; other policies plug in through
//! [`ConfidencePolicy`].

use crate::patterns::HallucinationWarning;
use std::fmt::Debug;

/// Computes a report's overall confidence
pub trait ConfidencePolicy: Debug + Send + Sync {
    /// Score in [0, 1]; 0 when there were no claims at all
    fn confidence(&self, verified: usize, unverified: usize, warnings: &[HallucinationWarning]) -> f64;
}

/// `max(0, verified / total - penalty * warnings)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearWarningPenalty {
    penalty: f64,
    exempt_assumptions: bool,
}

impl LinearWarningPenalty {
    /// Policy with the given per-warning penalty
    #[inline]
    #[must_use]
    pub fn new(penalty: f64) -> Self {
        Self {
            penalty,
            exempt_assumptions: false,
        }
    }

    /// Exempt assumption categories from the penalty
    #[inline]
    #[must_use]
    pub fn with_exempt_assumptions(mut self, exempt: bool) -> Self {
        self.exempt_assumptions = exempt;
        self
    }

    /// Per-warning penalty
    #[inline]
    #[must_use]
    pub fn penalty(&self) -> f64 {
        self.penalty
    }
}

impl Default for LinearWarningPenalty {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl ConfidencePolicy for LinearWarningPenalty {
    #[allow(clippy::cast_precision_loss)]
    fn confidence(&self, verified: usize, unverified: usize, warnings: &[HallucinationWarning]) -> f64 {
        let total = verified + unverified;
        if total == 0 {
            return 0.0;
        }

        let penalized = warnings
            .iter()
            .filter(|w| !(self.exempt_assumptions && w.category.is_assumption()))
            .count();
        let base = verified as f64 / total as f64;
        (base - self.penalty * penalized as f64).clamp(0.0, 1.0)
    }
}
