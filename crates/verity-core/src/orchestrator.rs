//! Verification orchestrator
//!
//! The facade over every other component. One call takes a worker's output
//! through extraction, ground-truth checks, optional peer corroboration,
//! pattern scanning and confidence aggregation, and returns an immutable
//! [`VerificationReport`]. A call never fails: anything that cannot be decided
//! is reported as unverified.

use crate::config::VerificationConfig;
use crate::confidence::{ConfidencePolicy, LinearWarningPenalty};
use crate::cross_validation::CrossWorkerValidator;
use crate::evidence::{EvidenceChain, EvidenceSource};
use crate::patterns::{HallucinationWarning, PatternDetector};
use crate::report::{ReportStatus, VerificationReport};
use crate::uncertainty::{ConfirmationRequest, UncertaintyHandler};
use chrono::Utc;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use verity_claim::{AssertionForm, Claim, ClaimKind, ClaimPayload, FactExtractor, WorkerOutput};
use verity_ground::{FileSystemVerifier, SourceStructureVerifier, SymbolQuery};

/// What happened to one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Checked; `true` if confirmed
    Checked(bool),
    /// Not checkable; the named fields were missing
    Malformed(Vec<&'static str>),
}

/// Decide a report's status from its unverified claims and confidence
#[must_use]
pub fn decide_status(
    config: &VerificationConfig,
    has_unverified: bool,
    confidence: f64,
) -> ReportStatus {
    if has_unverified && config.fail_on_unverified_claims {
        ReportStatus::Failed
    } else if confidence < config.confidence_threshold {
        ReportStatus::LowConfidence
    } else {
        ReportStatus::Verified
    }
}

/// Verifies worker outputs
///
/// Cheap to share behind an `Arc`; concurrent calls only meet in the evidence
/// chain and the validator cache, both of which are thread-safe.
#[derive(Debug)]
pub struct VerificationOrchestrator {
    config: Arc<VerificationConfig>,
    extractor: FactExtractor,
    file_system: FileSystemVerifier,
    structure: SourceStructureVerifier,
    detector: PatternDetector,
    evidence: Arc<EvidenceChain>,
    validator: Arc<CrossWorkerValidator>,
    policy: Arc<dyn ConfidencePolicy>,
    uncertainty: UncertaintyHandler,
}

impl VerificationOrchestrator {
    /// Create orchestrator with fresh evidence chain and validator
    #[must_use]
    pub fn new(config: Arc<VerificationConfig>) -> Self {
        let limits = config.check_limits();
        let policy = LinearWarningPenalty::new(config.warning_penalty)
            .with_exempt_assumptions(config.allow_assumptions);

        Self {
            extractor: FactExtractor::new(),
            file_system: FileSystemVerifier::new(limits),
            structure: SourceStructureVerifier::new(
                limits,
                config.strict_mode,
                config.outline_cache_capacity,
            ),
            detector: PatternDetector::new(),
            evidence: Arc::new(EvidenceChain::new()),
            validator: Arc::new(CrossWorkerValidator::new(config.minimum_verification_sources)),
            policy: Arc::new(policy),
            uncertainty: UncertaintyHandler::new(),
            config,
        }
    }

    /// Share an existing evidence chain
    #[must_use]
    pub fn with_evidence_chain(mut self, evidence: Arc<EvidenceChain>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Share an existing cross-worker validator
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<CrossWorkerValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the confidence policy
    #[must_use]
    pub fn with_policy(mut self, policy: impl ConfidencePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Evidence chain every check is recorded in
    #[inline]
    #[must_use]
    pub fn evidence_chain(&self) -> &Arc<EvidenceChain> {
        &self.evidence
    }

    /// Cross-worker validator
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Arc<CrossWorkerValidator> {
        &self.validator
    }

    /// File system verifier, e.g. for directory-shape checks
    #[inline]
    #[must_use]
    pub fn file_system(&self) -> &FileSystemVerifier {
        &self.file_system
    }

    /// Source structure verifier
    #[inline]
    #[must_use]
    pub fn structure(&self) -> &SourceStructureVerifier {
        &self.structure
    }

    /// Verify an output against ground truth only
    pub async fn verify_output(&self, worker: &str, output: &WorkerOutput) -> VerificationReport {
        self.verify_with_peers(worker, output, &[]).await
    }

    /// Verify an output, letting peer reports corroborate free-text claims
    ///
    /// Reports from `worker` itself are ignored as peers.
    pub async fn verify_with_peers(
        &self,
        worker: &str,
        output: &WorkerOutput,
        peers: &[VerificationReport],
    ) -> VerificationReport {
        let span = tracing::info_span!("verify_output", worker = %worker);
        self.run(worker, output, peers).instrument(span).await
    }

    async fn run(
        &self,
        worker: &str,
        output: &WorkerOutput,
        peers: &[VerificationReport],
    ) -> VerificationReport {
        let peers: Vec<VerificationReport> = peers
            .iter()
            .filter(|peer| peer.worker != worker)
            .cloned()
            .collect();

        let claims = self.extractor.extract(output);
        let outcomes = join_all(claims.iter().map(|claim| self.check_claim(claim, &peers))).await;

        let mut verified_facts = Vec::new();
        let mut unverified_claims = Vec::new();
        let mut warnings = Vec::new();

        for (claim, outcome) in claims.into_iter().zip(outcomes) {
            match outcome {
                ClaimOutcome::Checked(true) => verified_facts.push(claim),
                ClaimOutcome::Checked(false) => unverified_claims.push(claim),
                ClaimOutcome::Malformed(missing) => {
                    tracing::warn!(claim = %claim, ?missing, "malformed claim");
                    warnings.push(HallucinationWarning::malformed_claim(
                        claim.to_string(),
                        &missing,
                    ));
                    unverified_claims.push(claim);
                }
            }
        }

        warnings.extend(self.detector.scan_all(output.free_text_fields()));

        let overall_confidence =
            self.policy
                .confidence(verified_facts.len(), unverified_claims.len(), &warnings);
        let status = decide_status(&self.config, !unverified_claims.is_empty(), overall_confidence);

        tracing::info!(
            verified = verified_facts.len(),
            unverified = unverified_claims.len(),
            warnings = warnings.len(),
            confidence = overall_confidence,
            %status,
            "verification complete"
        );

        VerificationReport {
            worker: worker.to_string(),
            timestamp: Utc::now(),
            verified_facts,
            unverified_claims,
            warnings,
            overall_confidence,
            status,
        }
    }

    /// Check one claim, recording evidence for every check that runs
    pub async fn check_claim(&self, claim: &Claim, peers: &[VerificationReport]) -> ClaimOutcome {
        let missing = claim.missing_fields();
        if !missing.is_empty() {
            return ClaimOutcome::Malformed(missing);
        }

        let path = claim.path();
        let verified = match (claim.kind(), claim.payload()) {
            (ClaimKind::FileReference, _) => {
                let ok = self.file_system.verify_path(path).await;
                self.record(claim, EvidenceSource::FileSystem, "path_exists", ok)
            }
            (ClaimKind::CodeSnippet, ClaimPayload::Snippet(target)) => {
                let ok = self.file_system.verify_snippet(path, &target.snippet).await;
                self.record(claim, EvidenceSource::FileSystem, "snippet_contained", ok)
            }
            (ClaimKind::FunctionReference, ClaimPayload::Symbol(target)) => {
                self.check_symbol(claim, SymbolQuery::Function, &target.symbol).await
            }
            (ClaimKind::ClassReference, ClaimPayload::Symbol(target)) => {
                self.check_symbol(claim, SymbolQuery::Class, &target.symbol).await
            }
            (ClaimKind::ImportReference, ClaimPayload::Symbol(target)) => {
                self.check_symbol(claim, SymbolQuery::Import, &target.symbol).await
            }
            (ClaimKind::FreeTextAssertion, ClaimPayload::Assertion(assertion)) => {
                let grounded = match assertion.form {
                    AssertionForm::FileContains => {
                        let ok = self.file_system.verify_contains(path, &assertion.subject).await;
                        self.record(claim, EvidenceSource::FileSystem, "file_contains", ok)
                    }
                    AssertionForm::FunctionIn => {
                        self.check_symbol(claim, SymbolQuery::Function, &assertion.subject).await
                    }
                    AssertionForm::ClassIn => {
                        self.check_symbol(claim, SymbolQuery::Class, &assertion.subject).await
                    }
                    AssertionForm::ImportFrom => {
                        self.check_symbol(claim, SymbolQuery::Import, &assertion.subject).await
                    }
                };
                grounded || self.corroborate(claim, peers)
            }
            // missing_fields() rejects every other combination
            _ => false,
        };

        tracing::debug!(claim = %claim, verified, "claim checked");
        ClaimOutcome::Checked(verified)
    }

    async fn check_symbol(&self, claim: &Claim, query: SymbolQuery, name: &str) -> bool {
        let ok = self.structure.has_symbol(Path::new(claim.path()), query, name).await;
        let method = match query {
            SymbolQuery::Function => "function_defined",
            SymbolQuery::Class => "class_defined",
            SymbolQuery::Import => "import_present",
        };
        self.record(claim, EvidenceSource::SourceStructure, method, ok)
    }

    fn corroborate(&self, claim: &Claim, peers: &[VerificationReport]) -> bool {
        if peers.is_empty() || !self.config.cross_validation_required {
            return false;
        }
        let ok = self.validator.validate(claim, peers);
        self.record(claim, EvidenceSource::CrossWorker, "peer_confirmation", ok)
    }

    fn record(&self, claim: &Claim, source: EvidenceSource, method: &str, verified: bool) -> bool {
        self.evidence.append(claim, source, method, verified);
        verified
    }

    /// Confirmation request for a report that needs a human
    ///
    /// `Some` when the report has unverified claims and its confidence is
    /// below `user_confirmation_threshold`.
    #[must_use]
    pub fn confirmation_for(&self, report: &VerificationReport) -> Option<ConfirmationRequest> {
        let needs_user = !report.unverified_claims.is_empty()
            && report.overall_confidence < self.config.user_confirmation_threshold;
        needs_user.then(|| {
            self.uncertainty
                .require_user_confirmation(&report.unverified_claims)
        })
    }

    /// Statement rewritten according to the report's confidence
    #[must_use]
    pub fn safe_response(&self, statement: &str, report: &VerificationReport) -> String {
        self.uncertainty
            .safe_response(statement, report.overall_confidence)
    }
}

impl Default for VerificationOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(VerificationConfig::default()))
    }
}
