//! Ground-truth checks
//!
//! Answers questions about the local file system and the structure of source
//! files:
//!
//! - [`FileSystemVerifier`]: path existence, directory shape, snippet containment
//! - [`SourceStructureVerifier`]: function, class and import presence from a
//!   tree-sitter outline
//!
//! Every public check returns `bool` and fails closed: I/O errors, oversized
//! files, parse failures and timeouts all answer `false`.
//!
//! # Example
//!
//! ```no_run
//! use verity_ground::{CheckLimits, FileSystemVerifier, SourceStructureVerifier};
//!
//! # async fn demo() {
//! let fs = FileSystemVerifier::new(CheckLimits::default());
//! let exists = fs.verify_path("src/main.py").await;
//!
//! let structure = SourceStructureVerifier::default();
//! let defined = structure.function_exists("src/main.py", "main").await;
//! # let _ = (exists, defined);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod fs;
pub mod outline;
pub mod structure;

pub use error::{GroundError, GroundResult};
pub use fs::{
    normalize_whitespace, CheckLimits, EntryKind, FileSystemVerifier, DEFAULT_CHECK_TIMEOUT,
    DEFAULT_MAX_FILE_SIZE,
};
pub use outline::{Language, SourceOutline};
pub use structure::{SourceStructureVerifier, SymbolQuery, DEFAULT_OUTLINE_CACHE_CAPACITY};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
