//! Verification reports
//!
//! A [`VerificationReport`] is the immutable result of one orchestrator call.
//! Reports from other workers are read back as peers for cross-validation, so
//! the serialized form is also the input format of [`VerificationReport::from_json`].

use crate::patterns::HallucinationWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use verity_claim::Claim;

/// Overall outcome of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every claim checked out and confidence met the threshold
    Verified,
    /// No blocking failures, but confidence is below the threshold
    LowConfidence,
    /// Unverified claims under a fail-on-unverified policy
    Failed,
}

impl ReportStatus {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Verified => "verified",
            ReportStatus::LowConfidence => "low_confidence",
            ReportStatus::Failed => "failed",
        }
    }
}

impl Display for ReportStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of verifying one worker output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Worker that produced the output
    #[serde(alias = "agent")]
    pub worker: String,
    /// When verification finished
    pub timestamp: DateTime<Utc>,
    /// Claims confirmed by ground truth or peers
    #[serde(default)]
    pub verified_facts: Vec<Claim>,
    /// Claims that could not be confirmed, including malformed ones
    #[serde(default)]
    pub unverified_claims: Vec<Claim>,
    /// Hedging language and malformed-claim warnings
    #[serde(default, alias = "hallucination_warnings")]
    pub warnings: Vec<HallucinationWarning>,
    /// Aggregate confidence in [0, 1]
    pub overall_confidence: f64,
    /// Overall outcome
    #[serde(alias = "verification_status")]
    pub status: ReportStatus,
}

impl VerificationReport {
    /// True if the status is `verified`
    #[inline]
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == ReportStatus::Verified
    }

    /// True if `claim` (same kind and payload) is among the verified facts
    #[must_use]
    pub fn confirms(&self, claim: &Claim) -> bool {
        self.verified_facts.iter().any(|fact| fact.same_assertion(claim))
    }

    /// Decode a report
    ///
    /// # Errors
    /// Returns error if the document is not a valid report
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> VerificationReport {
        VerificationReport {
            worker: "builder".into(),
            timestamp: Utc::now(),
            verified_facts: vec![Claim::file("main.py"), Claim::function("main.py", "run")],
            unverified_claims: vec![Claim::class("main.py", "Ghost")],
            warnings: Vec::new(),
            overall_confidence: 0.5,
            status: ReportStatus::Failed,
        }
    }

    #[test]
    fn confirms_uses_assertion_equality() {
        let report = report();
        assert!(report.confirms(&Claim::function("main.py", "run")));
        assert!(!report.confirms(&Claim::class("main.py", "run")));
        assert!(!report.confirms(&Claim::class("main.py", "Ghost")));
        assert!(!report.is_verified());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["worker"], "builder");
        assert_eq!(json["verified_facts"][0]["kind"], "file_reference");
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn json_roundtrip_and_legacy_keys() {
        let original = report();
        let back = VerificationReport::from_json(&original.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, original);

        let legacy = r#"{
            "agent": "reviewer",
            "timestamp": "2026-01-01T00:00:00Z",
            "verified_facts": [{"kind": "file_reference", "payload": {"path": "a.py"}}],
            "hallucination_warnings": [],
            "overall_confidence": 1.0,
            "verification_status": "low_confidence"
        }"#;
        let peer = VerificationReport::from_json(legacy).unwrap();
        assert_eq!(peer.worker, "reviewer");
        assert_eq!(peer.status, ReportStatus::LowConfidence);
        assert!(peer.confirms(&Claim::file("a.py")));
    }
}
