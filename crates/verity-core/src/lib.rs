//! Verity core
//!
//! Verifies what a worker claims about a codebase before anyone acts on it.
//! A [`VerificationOrchestrator`] turns a [`WorkerOutput`] into typed claims,
//! checks each against the file system and parsed source, consults peer
//! reports for free-text assertions, scans free text for hedging language and
//! returns a [`VerificationReport`] with a confidence and a status.
//!
//! Every check is recorded in an append-only [`EvidenceChain`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verity_core::{VerificationConfig, VerificationOrchestrator, WorkerOutput};
//!
//! # async fn demo() {
//! let orchestrator = VerificationOrchestrator::new(Arc::new(VerificationConfig::default()));
//! let output = WorkerOutput::new()
//!     .with_file("src/main.py")
//!     .with_function("src/main.py", "main");
//!
//! let report = orchestrator.verify_output("builder", &output).await;
//! if !report.is_verified() {
//!     if let Some(request) = orchestrator.confirmation_for(&report) {
//!         println!("{}", request.message);
//!     }
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod confidence;
pub mod config;
pub mod cross_validation;
pub mod error;
pub mod evidence;
pub mod orchestrator;
pub mod patterns;
pub mod report;
pub mod uncertainty;

pub use confidence::{ConfidencePolicy, LinearWarningPenalty};
pub use config::{global, install, VerificationConfig, DEFAULT_CONFIG_PATH};
pub use cross_validation::CrossWorkerValidator;
pub use error::{ConfigError, Result, VerityError};
pub use evidence::{Evidence, EvidenceChain, EvidenceId, EvidenceSource};
pub use orchestrator::{decide_status, ClaimOutcome, VerificationOrchestrator};
pub use patterns::{HallucinationWarning, PatternDetector, WarningCategory, HALLUCINATION_PATTERNS};
pub use report::{ReportStatus, VerificationReport};
pub use uncertainty::{ConfirmationRequest, TrustLabel, UncertaintyHandler, CONFIRMATION_STATUS};

pub use verity_claim::{Claim, ClaimKind, FactExtractor, WorkerOutput};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
