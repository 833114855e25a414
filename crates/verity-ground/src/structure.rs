//! Source structure checks
//!
//! Answers "is function/class X defined in file P" and "does P import X" from
//! a [`SourceOutline`]. Outlines are cached per (canonical path, modification
//! time, length); an edited file produces a new key, so a stale outline is
//! never consulted.

use crate::error::{GroundError, GroundResult};
use crate::fs::{bounded, read_source, CheckLimits};
use crate::outline::{Language, SourceOutline};
use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Default number of cached outlines
pub const DEFAULT_OUTLINE_CACHE_CAPACITY: u64 = 1024;

/// Kind of structural query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolQuery {
    /// Function or method definition
    Function,
    /// Class or type definition
    Class,
    /// Imported module or name
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OutlineKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

/// Verifies structural claims about source files
#[derive(Debug, Clone)]
pub struct SourceStructureVerifier {
    limits: CheckLimits,
    strict_mode: bool,
    cache: Cache<OutlineKey, Arc<SourceOutline>>,
}

impl SourceStructureVerifier {
    /// Create verifier
    ///
    /// With `strict_mode` off, files without a grammar are outlined with a
    /// line scan instead of being reported as unverifiable.
    #[must_use]
    pub fn new(limits: CheckLimits, strict_mode: bool, cache_capacity: u64) -> Self {
        Self {
            limits,
            strict_mode,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Configured limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &CheckLimits {
        &self.limits
    }

    /// Whether files without a grammar are rejected
    #[inline]
    #[must_use]
    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// True iff a function or method named `name` is defined in `path`
    pub async fn function_exists(&self, path: impl AsRef<Path>, name: &str) -> bool {
        self.has_symbol(path.as_ref(), SymbolQuery::Function, name).await
    }

    /// True iff a class named `name` is defined in `path`
    pub async fn class_exists(&self, path: impl AsRef<Path>, name: &str) -> bool {
        self.has_symbol(path.as_ref(), SymbolQuery::Class, name).await
    }

    /// True iff `path` imports `name`
    pub async fn import_exists(&self, path: impl AsRef<Path>, name: &str) -> bool {
        self.has_symbol(path.as_ref(), SymbolQuery::Import, name).await
    }

    /// Run one structural query; any failure is "not present"
    pub async fn has_symbol(&self, path: &Path, query: SymbolQuery, name: &str) -> bool {
        if name.trim().is_empty() || path.as_os_str().is_empty() {
            return false;
        }

        match self.outline(path).await {
            Ok(outline) => match query {
                SymbolQuery::Function => outline.has_function(name),
                SymbolQuery::Class => outline.has_class(name),
                SymbolQuery::Import => outline.has_import(name),
            },
            Err(e) => {
                tracing::debug!(path = %path.display(), ?query, error = %e, "structure check failed");
                false
            }
        }
    }

    /// Outline of `path`, from cache when the file is unchanged
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is too large, has no grammar
    /// (in strict mode), fails to parse cleanly or the check times out.
    pub async fn outline(&self, path: impl AsRef<Path>) -> GroundResult<Arc<SourceOutline>> {
        let path = path.as_ref();
        bounded(path, &self.limits, self.load_outline(path)).await
    }

    /// Number of cached outlines, after pending cache maintenance has run
    pub async fn cached_outlines(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    async fn load_outline(&self, path: &Path) -> GroundResult<Arc<SourceOutline>> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| GroundError::io_error(path, &e))?;
        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| GroundError::io_error(path, &e))?;

        let key = OutlineKey {
            path: canonical.clone(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let language = Language::from_path(&canonical);
        if language.is_none() && self.strict_mode {
            return Err(GroundError::UnsupportedLanguage(path.to_path_buf()));
        }

        let source = read_source(&canonical, &self.limits).await?;
        let outline = match language {
            Some(language) => {
                let owned = path.to_path_buf();
                tokio::task::spawn_blocking(move || SourceOutline::parse(&owned, &source, language))
                    .await
                    .map_err(|e| GroundError::ParserInit(format!("parse task failed: {e}")))??
            }
            None => SourceOutline::scan(&source),
        };

        let outline = Arc::new(outline);
        self.cache.insert(key, Arc::clone(&outline)).await;
        Ok(outline)
    }
}

impl Default for SourceStructureVerifier {
    fn default() -> Self {
        Self::new(CheckLimits::default(), true, DEFAULT_OUTLINE_CACHE_CAPACITY)
    }
}
