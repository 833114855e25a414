//! Verity Claim Model
//!
//! Typed claims extracted from the output of code-generation workers.
//!
//! # Core Concepts
//!
//! - [`Claim`]: one checkable assertion (`file_reference`, `function_reference`,
//!   `class_reference`, `import_reference`, `code_snippet`, `free_text_assertion`)
//! - [`WorkerOutput`]: the structured record a worker hands over
//! - [`FactExtractor`]: turns a [`WorkerOutput`] into an ordered list of claims
//! - [`Fingerprint`]: Blake3 digest identifying what a claim asserts
//!
//! # Example
//!
//! ```rust
//! use verity_claim::{ClaimKind, FactExtractor, WorkerOutput};
//!
//! let output = WorkerOutput::new()
//!     .with_file("src/main.py")
//!     .with_analysis("The file src/main.py contains run_server");
//!
//! let claims = FactExtractor::new().extract(&output);
//! assert_eq!(claims.len(), 2);
//! assert_eq!(claims[1].kind(), ClaimKind::FreeTextAssertion);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod claim;
pub mod extract;
pub mod hash;
pub mod output;

// Re-exports
pub use claim::{
    AssertionForm, Claim, ClaimKind, ClaimPayload, PathTarget, SnippetTarget, SymbolTarget,
    TextAssertion,
};
pub use extract::FactExtractor;
pub use hash::{Fingerprint, FingerprintError};
pub use output::{ClassRef, FunctionRef, ImportRef, SnippetRef, WorkerOutput};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
