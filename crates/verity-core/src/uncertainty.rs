//! Uncertainty expression
//!
//! Maps a confidence score to a trust label, rewrites statements according to
//! how much of them could be verified, and builds the payload that asks a
//! human to confirm what the system could not.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use verity_claim::Claim;

/// Status string of every [`ConfirmationRequest`]
pub const CONFIRMATION_STATUS: &str = "user_verification_required";

/// Discrete trust level for a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustLabel {
    /// Score was not a number or negative
    Unknown,
    /// `[0, 0.5)`
    Unverified,
    /// `[0.5, 0.7)`
    Uncertain,
    /// `[0.7, 0.9)`
    Likely,
    /// `[0.9, 0.95)`
    Verified,
    /// `[0.95, ..]`
    Confirmed,
}

impl TrustLabel {
    /// Label for a confidence score
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        const THRESHOLDS: [(f64, TrustLabel); 5] = [
            (0.95, TrustLabel::Confirmed),
            (0.9, TrustLabel::Verified),
            (0.7, TrustLabel::Likely),
            (0.5, TrustLabel::Uncertain),
            (0.0, TrustLabel::Unverified),
        ];
        THRESHOLDS
            .iter()
            .find(|(threshold, _)| confidence >= *threshold)
            .map_or(TrustLabel::Unknown, |(_, label)| *label)
    }

    /// Bracketed marker, e.g. `[LIKELY]`
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            TrustLabel::Unknown => "[UNKNOWN]",
            TrustLabel::Unverified => "[UNVERIFIED]",
            TrustLabel::Uncertain => "[UNCERTAIN]",
            TrustLabel::Likely => "[LIKELY]",
            TrustLabel::Verified => "[VERIFIED]",
            TrustLabel::Confirmed => "[CONFIRMED]",
        }
    }
}

impl Display for TrustLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Request for a human to confirm claims the system could not verify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    /// Always [`CONFIRMATION_STATUS`]
    pub status: String,
    /// Claims needing confirmation
    #[serde(alias = "uncertain_facts")]
    pub claims: Vec<Claim>,
    /// Prompt for the user
    pub message: String,
    /// What the user can do about it
    pub suggested_actions: Vec<String>,
}

/// Expresses confidence in user-facing text
#[derive(Debug, Clone, Copy, Default)]
pub struct UncertaintyHandler;

impl UncertaintyHandler {
    /// Create handler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Prefix the statement with its trust marker
    #[must_use]
    pub fn express(&self, statement: &str, confidence: f64) -> String {
        format!("{} {statement}", TrustLabel::from_confidence(confidence))
    }

    /// Refuse, hedge or pass the statement through depending on confidence
    ///
    /// Below 0.5 (or not a number) the statement is presented as
    /// unverifiable; below 0.8 it is hedged; otherwise it is unchanged.
    #[must_use]
    pub fn safe_response(&self, statement: &str, confidence: f64) -> String {
        if confidence.is_nan() || confidence < 0.5 {
            format!("I cannot verify this information: {statement}")
        } else if confidence < 0.8 {
            format!("Based on limited verification: {statement}")
        } else {
            statement.to_string()
        }
    }

    /// Build a confirmation request for the given claims
    #[must_use]
    pub fn require_user_confirmation(&self, claims: &[Claim]) -> ConfirmationRequest {
        ConfirmationRequest {
            status: CONFIRMATION_STATUS.to_string(),
            claims: claims.to_vec(),
            message: "Cannot proceed without verifying these facts:".to_string(),
            suggested_actions: [
                "Manually verify the facts",
                "Provide additional context",
                "Skip uncertain operations",
                "Proceed with explicit acknowledgment of uncertainty",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}
