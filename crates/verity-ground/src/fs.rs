//! File system checks
//!
//! Existence, directory-shape and snippet-containment checks. Every check
//! fails closed: a missing path, an unreadable or oversized file and a check
//! that exceeds its timeout are all "not verified", never an error.

use crate::error::{GroundError, GroundResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-check timeout
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum file size read by a check (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Bounds applied to every ground-truth check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckLimits {
    /// Wall-clock budget for one check (I/O plus parsing)
    pub timeout: Duration,
    /// Files larger than this are never read
    pub max_file_size: u64,
}

impl CheckLimits {
    /// Create limits
    #[inline]
    #[must_use]
    pub fn new(timeout: Duration, max_file_size: u64) -> Self {
        Self {
            timeout,
            max_file_size,
        }
    }
}

impl Default for CheckLimits {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_FILE_SIZE)
    }
}

/// Kind of entry expected at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Run `fut` within the check timeout
pub(crate) async fn bounded<T, F>(path: &Path, limits: &CheckLimits, fut: F) -> GroundResult<T>
where
    F: Future<Output = GroundResult<T>>,
{
    match tokio::time::timeout(limits.timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(GroundError::timeout(path, limits.timeout)),
    }
}

/// Read a file as UTF-8, refusing anything over the size limit
///
/// The timeout is not applied here; wrap the call with the caller's budget.
pub(crate) async fn read_source(path: &Path, limits: &CheckLimits) -> GroundResult<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| GroundError::io_error(path, &e))?;

    if !metadata.is_file() {
        return Err(GroundError::Io {
            path: path.to_path_buf(),
            message: "not a regular file".to_string(),
        });
    }
    if metadata.len() > limits.max_file_size {
        return Err(GroundError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: limits.max_file_size,
        });
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GroundError::io_error(path, &e))
}

/// Canonical whitespace form used for snippet containment
///
/// Leading and trailing whitespace is dropped. A run of whitespace between
/// two word characters becomes a single space; a run next to punctuation is
/// removed, so `def hello( ):` and `def hello():` normalise alike.
///
/// The rule has no notion of string literals: `print(" a")` and `print("a")`
/// also normalise alike, so a snippet can differ from the file in spacing
/// inside quotes next to punctuation.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space && is_word_char(c) && out.chars().next_back().is_some_and(is_word_char) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Verifies file system claims
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemVerifier {
    limits: CheckLimits,
}

impl FileSystemVerifier {
    /// Create verifier with limits
    #[inline]
    #[must_use]
    pub fn new(limits: CheckLimits) -> Self {
        Self { limits }
    }

    /// Configured limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &CheckLimits {
        &self.limits
    }

    /// True iff `path` exists at call time
    ///
    /// An empty path is never verified.
    pub async fn verify_path(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return false;
        }

        let result = bounded(path, &self.limits, async {
            Ok(tokio::fs::metadata(path).await.is_ok())
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "path check failed");
            false
        })
    }

    /// True iff `snippet` appears in the file once whitespace is normalised
    ///
    /// Both the file and the snippet go through [`normalize_whitespace`]
    /// before the containment check, so indentation, line breaks and spacing
    /// around punctuation need not match. A blank snippet is never verified.
    pub async fn verify_snippet(&self, path: impl AsRef<Path>, snippet: &str) -> bool {
        let needle = normalize_whitespace(snippet);
        if needle.is_empty() {
            return false;
        }

        self.check_content(path.as_ref(), |content| {
            normalize_whitespace(content).contains(&needle)
        })
        .await
    }

    /// True iff `needle` appears verbatim in the file
    pub async fn verify_contains(&self, path: impl AsRef<Path>, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        self.check_content(path.as_ref(), |content| content.contains(needle))
            .await
    }

    /// True iff every entry exists with the declared kind
    pub async fn verify_directory_structure(&self, structure: &BTreeMap<PathBuf, EntryKind>) -> bool {
        for (path, expected) in structure {
            let result = bounded(path, &self.limits, async {
                let metadata = tokio::fs::metadata(path)
                    .await
                    .map_err(|e| GroundError::io_error(path, &e))?;
                Ok(match expected {
                    EntryKind::File => metadata.is_file(),
                    EntryKind::Directory => metadata.is_dir(),
                })
            })
            .await;

            match result {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(path = %path.display(), ?expected, "entry has wrong kind");
                    return false;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "entry check failed");
                    return false;
                }
            }
        }
        true
    }

    async fn check_content<F>(&self, path: &Path, predicate: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if path.as_os_str().is_empty() {
            return false;
        }
        self.judge_content(path, read_source(path, &self.limits), predicate)
            .await
    }

    /// Apply `predicate` to the content `read` yields within the timeout
    async fn judge_content<R, F>(&self, path: &Path, read: R, predicate: F) -> bool
    where
        R: Future<Output = GroundResult<String>>,
        F: FnOnce(&str) -> bool,
    {
        match bounded(path, &self.limits, read).await {
            Ok(content) => predicate(&content),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "content check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn existing_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "test.py", "print('hello')");
        let verifier = FileSystemVerifier::default();

        assert!(verifier.verify_path(&file).await);
        assert!(verifier.verify_path(dir.path()).await);
        assert!(!verifier.verify_path(dir.path().join("fake.py")).await);
        assert!(!verifier.verify_path("").await);
    }

    #[tokio::test]
    async fn snippet_present_and_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "test.py", "def hello():\n    print('world')");
        let verifier = FileSystemVerifier::default();

        assert!(verifier.verify_snippet(&file, "def hello():").await);
        assert!(verifier.verify_snippet(&file, "print('world')").await);
        assert!(!verifier.verify_snippet(&file, "def goodbye():").await);
    }

    #[tokio::test]
    async fn snippet_whitespace_is_normalised() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "test.py", "def hello():\n pass");
        let verifier = FileSystemVerifier::default();

        assert!(verifier.verify_snippet(&file, "def   hello():\n\n\tpass").await);
        assert!(verifier.verify_snippet(&file, "hello():  pass").await);
        assert!(verifier.verify_snippet(&file, "def hello( ):").await);
        assert!(!verifier.verify_snippet(&file, "defhello():").await);
    }

    #[tokio::test]
    async fn snippet_on_missing_file_fails_closed() {
        let verifier = FileSystemVerifier::default();
        assert!(!verifier.verify_snippet("/no/such/file.py", "anything").await);
        assert!(!verifier.verify_snippet("", "anything").await);
    }

    #[tokio::test]
    async fn blank_snippet_is_not_verified() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.py", "x = 1");
        assert!(!FileSystemVerifier::default().verify_snippet(&file, " \n ").await);
    }

    #[tokio::test]
    async fn oversized_file_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "big.py", "x = 1\n".repeat(100).as_str());
        let verifier = FileSystemVerifier::new(CheckLimits::new(DEFAULT_CHECK_TIMEOUT, 16));

        assert!(verifier.verify_path(&file).await);
        assert!(!verifier.verify_snippet(&file, "x = 1").await);
    }

    #[tokio::test]
    async fn contains_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.py", "def real_function():\n    return True");
        let verifier = FileSystemVerifier::default();

        assert!(verifier.verify_contains(&file, "real_function").await);
        assert!(!verifier.verify_contains(&file, "fake_function").await);
    }

    #[tokio::test]
    async fn directory_structure() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        let file = write(dir.path(), "file.txt", "test");
        let verifier = FileSystemVerifier::default();

        let mut structure = BTreeMap::new();
        structure.insert(dir.path().to_path_buf(), EntryKind::Directory);
        structure.insert(dir.path().join("subdir"), EntryKind::Directory);
        structure.insert(file.clone(), EntryKind::File);
        assert!(verifier.verify_directory_structure(&structure).await);

        structure.insert(dir.path().join("fake"), EntryKind::Directory);
        assert!(!verifier.verify_directory_structure(&structure).await);

        structure.remove(&dir.path().join("fake"));
        structure.insert(file, EntryKind::Directory);
        assert!(!verifier.verify_directory_structure(&structure).await);
    }

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize_whitespace("  a\n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("def hello( ):\n    pass"), "def hello():pass");
        assert_eq!(normalize_whitespace("x  =  1"), "x=1");
    }

    #[tokio::test]
    async fn spacing_inside_quotes_is_not_significant() {
        assert_eq!(normalize_whitespace(r#"print(" a")"#), normalize_whitespace(r#"print("a")"#));

        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "quotes.py", "print(\"a\")\n");
        assert!(FileSystemVerifier::default().verify_snippet(&file, "print(\" a\")").await);
        assert!(!FileSystemVerifier::default().verify_snippet(&file, "print(\"b\")").await);
    }

    fn tight_limits() -> CheckLimits {
        CheckLimits::new(Duration::from_millis(20), DEFAULT_MAX_FILE_SIZE)
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let result: GroundResult<()> =
            bounded(Path::new("x"), &tight_limits(), std::future::pending()).await;
        assert!(matches!(
            result,
            Err(GroundError::Timeout { elapsed, .. }) if elapsed == Duration::from_millis(20)
        ));
    }

    #[tokio::test]
    async fn timed_out_read_is_not_verified() {
        let verifier = FileSystemVerifier::new(tight_limits());

        let stalled = verifier
            .judge_content(Path::new("slow.py"), std::future::pending(), |_| true)
            .await;
        assert!(!stalled);

        let prompt = verifier
            .judge_content(Path::new("fast.py"), async { Ok("def f(): pass".to_string()) }, |c| {
                c.contains("def f")
            })
            .await;
        assert!(prompt);
    }

    proptest! {
        #[test]
        fn normalized_text_has_no_whitespace_runs(text in "\\PC*") {
            let normalized = normalize_whitespace(&text);
            prop_assert!(!normalized.contains("  "));
            prop_assert_eq!(normalized.trim(), normalized.as_str());
            prop_assert_eq!(normalize_whitespace(&normalized), normalized.clone());
        }
    }
}
