//! Cross-worker validation
//!
//! Accepts a claim once enough other workers independently list it among
//! their own verified facts. Outcomes are cached per claim fingerprint; the
//! first result for a claim is the one every later call sees.

use crate::report::VerificationReport;
use dashmap::DashMap;
use std::collections::BTreeSet;
use verity_claim::{Claim, Fingerprint};

/// Validates claims against peer reports
#[derive(Debug)]
pub struct CrossWorkerValidator {
    min_sources: usize,
    cache: DashMap<Fingerprint, bool>,
}

impl CrossWorkerValidator {
    /// Create validator requiring `min_sources` confirming workers
    #[must_use]
    pub fn new(min_sources: usize) -> Self {
        Self {
            min_sources: min_sources.max(1),
            cache: DashMap::new(),
        }
    }

    /// Confirmations required
    #[inline]
    #[must_use]
    pub fn min_sources(&self) -> usize {
        self.min_sources
    }

    /// True iff at least `min_sources` distinct workers confirm `claim`
    ///
    /// A worker appearing in several peer reports counts once.
    pub fn validate(&self, claim: &Claim, peers: &[VerificationReport]) -> bool {
        let key = claim.fingerprint();
        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let confirming: BTreeSet<&str> = peers
            .iter()
            .filter(|report| report.confirms(claim))
            .map(|report| report.worker.as_str())
            .collect();
        let result = confirming.len() >= self.min_sources;

        tracing::debug!(
            claim = %claim,
            confirmations = confirming.len(),
            required = self.min_sources,
            result,
            "cross-worker validation"
        );

        // Another caller may have raced us to the same key; theirs wins.
        *self.cache.entry(key).or_insert(result)
    }

    /// Cached outcome for `claim`, if it was validated before
    #[must_use]
    pub fn cached(&self, claim: &Claim) -> Option<bool> {
        self.cache.get(&claim.fingerprint()).map(|v| *v)
    }

    /// Number of cached outcomes
    #[inline]
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CrossWorkerValidator {
    fn default() -> Self {
        Self::new(2)
    }
}
