//! Hallucination pattern detection
//!
//! Flags hedging, speculative and generalising language in free text. Each
//! match of each pattern yields one [`HallucinationWarning`] carrying a window
//! of surrounding text for human review.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Characters of context kept on each side of a match
pub const CONTEXT_CHARS: usize = 50;

/// What kind of unsupported reasoning a pattern indicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    /// An unstated premise ("should", "expected to")
    Assumption,
    /// A probability given without support ("likely")
    ProbabilityWithoutEvidence,
    /// A broad rule applied to a specific case ("typically")
    Generalization,
    /// A guess ("probably", "often indicates")
    Speculation,
    /// A premise stated as such ("assuming that")
    ExplicitAssumption,
    /// A hedged chain of reasoning ("if ... then ... might")
    ConditionalSpeculation,
    /// A claim that was missing required fields
    MalformedClaim,
}

impl WarningCategory {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::Assumption => "assumption",
            WarningCategory::ProbabilityWithoutEvidence => "probability_without_evidence",
            WarningCategory::Generalization => "generalization",
            WarningCategory::Speculation => "speculation",
            WarningCategory::ExplicitAssumption => "explicit_assumption",
            WarningCategory::ConditionalSpeculation => "conditional_speculation",
            WarningCategory::MalformedClaim => "malformed_claim",
        }
    }

    /// True for the categories exempted by `allow_assumptions`
    #[inline]
    #[must_use]
    pub fn is_assumption(&self) -> bool {
        matches!(
            self,
            WarningCategory::Assumption | WarningCategory::ExplicitAssumption
        )
    }
}

impl Display for WarningCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A linguistic marker of unsupported reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationWarning {
    /// Pattern that matched
    pub pattern: String,
    /// Category of the pattern
    #[serde(alias = "type")]
    pub category: WarningCategory,
    /// Weight in (0, 1]
    pub severity: f64,
    /// Match plus up to 50 characters either side
    pub context: String,
    /// Byte offset of the match in the scanned text
    pub position: usize,
}

impl HallucinationWarning {
    /// Synthetic warning for a claim that could not be checked
    #[must_use]
    pub fn malformed_claim(description: impl Into<String>, missing: &[&str]) -> Self {
        Self {
            pattern: format!("missing: {}", missing.join(", ")),
            category: WarningCategory::MalformedClaim,
            severity: 1.0,
            context: description.into(),
            position: 0,
        }
    }
}

/// Pattern table: regex, category, severity
pub const HALLUCINATION_PATTERNS: &[(&str, WarningCategory, f64)] = &[
    (r"\bshould\b", WarningCategory::Assumption, 0.7),
    (r"\blikely\b", WarningCategory::ProbabilityWithoutEvidence, 0.8),
    (r"\btypically\b", WarningCategory::Generalization, 0.6),
    (r"\bprobably\b", WarningCategory::Speculation, 0.7),
    (r"\busually\s+means\b", WarningCategory::Generalization, 0.6),
    (r"\boften\s+indicates\b", WarningCategory::Speculation, 0.7),
    (r"\bcommonly\s+used\s+for\b", WarningCategory::Generalization, 0.5),
    (r"\bexpected\s+to\b", WarningCategory::Assumption, 0.7),
    (r"\bassuming\s+that\b", WarningCategory::ExplicitAssumption, 0.9),
    (
        r"\bif\s+.*\s+then\s+.*\s+might\b",
        WarningCategory::ConditionalSpeculation,
        0.8,
    ),
];

#[derive(Debug)]
struct CompiledPattern {
    source: &'static str,
    regex: Regex,
    category: WarningCategory,
    severity: f64,
}

static COMPILED: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    HALLUCINATION_PATTERNS
        .iter()
        .filter_map(|&(source, category, severity)| {
            RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|regex| CompiledPattern {
                    source,
                    regex,
                    category,
                    severity,
                })
        })
        .collect()
});

/// Scans free text for hallucination patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

impl PatternDetector {
    /// Create detector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One warning per match, ordered by position then table order
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<HallucinationWarning> {
        let mut warnings: Vec<HallucinationWarning> = COMPILED
            .iter()
            .flat_map(|pattern| {
                pattern.regex.find_iter(text).map(move |m| HallucinationWarning {
                    pattern: pattern.source.to_string(),
                    category: pattern.category,
                    severity: pattern.severity,
                    context: context_window(text, m.start(), m.end()),
                    position: m.start(),
                })
            })
            .collect();

        warnings.sort_by_key(|w| w.position);
        warnings
    }

    /// Scan several texts; warnings keep text order, then position order
    #[must_use]
    pub fn scan_all<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<HallucinationWarning> {
        texts.into_iter().flat_map(|text| self.scan(text)).collect()
    }
}

/// `text[start..end]` widened by [`CONTEXT_CHARS`] characters on each side
fn context_window(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].to_string()
}
