//! Typed claims
//!
//! A [`Claim`] is one checkable assertion taken from a worker's output: a
//! [`ClaimKind`], a kind-specific [`ClaimPayload`] and, for assertions lifted
//! out of prose, the sentence it came from. Claims are immutable once built.

use crate::hash::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of assertion a claim makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// A path exists
    FileReference,
    /// A function or method is defined in a file
    FunctionReference,
    /// A class (or type definition) is defined in a file
    ClassReference,
    /// A file imports a symbol or module
    ImportReference,
    /// A snippet of code appears in a file
    CodeSnippet,
    /// An assertion lifted out of free text
    FreeTextAssertion,
}

impl ClaimKind {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimKind::FileReference => "file_reference",
            ClaimKind::FunctionReference => "function_reference",
            ClaimKind::ClassReference => "class_reference",
            ClaimKind::ImportReference => "import_reference",
            ClaimKind::CodeSnippet => "code_snippet",
            ClaimKind::FreeTextAssertion => "free_text_assertion",
        }
    }
}

impl Display for ClaimKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of an assertion recognised in free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionForm {
    /// "file P contains N"
    FileContains,
    /// "function N in P"
    FunctionIn,
    /// "class N in P"
    ClassIn,
    /// "import N from P"
    ImportFrom,
}

impl AssertionForm {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionForm::FileContains => "file_contains",
            AssertionForm::FunctionIn => "function_in",
            AssertionForm::ClassIn => "class_in",
            AssertionForm::ImportFrom => "import_from",
        }
    }
}

/// `{path}` payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathTarget {
    /// Claimed path
    pub path: String,
}

/// `{path, symbol}` payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolTarget {
    /// File the symbol lives in
    pub path: String,
    /// Function, class or import name
    pub symbol: String,
}

/// `{path, snippet}` payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetTarget {
    /// File the snippet should appear in
    pub path: String,
    /// Claimed code text
    pub snippet: String,
}

/// Structured assertion recognised in free text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextAssertion {
    /// Recognised sentence shape
    pub form: AssertionForm,
    /// Named thing (content, function, class or import)
    pub subject: String,
    /// File the assertion is about
    pub path: String,
}

/// Kind-specific claim payload
///
/// Variants are distinguished by their field sets, most specific first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimPayload {
    /// `{path, snippet}`
    Snippet(SnippetTarget),
    /// `{path, symbol}`
    Symbol(SymbolTarget),
    /// `{form, subject, path}`
    Assertion(TextAssertion),
    /// `{path}`
    Path(PathTarget),
}

impl ClaimPayload {
    /// Path every payload refers to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            ClaimPayload::Snippet(t) => &t.path,
            ClaimPayload::Symbol(t) => &t.path,
            ClaimPayload::Assertion(t) => &t.path,
            ClaimPayload::Path(t) => &t.path,
        }
    }

    fn fields(&self) -> Vec<&[u8]> {
        match self {
            ClaimPayload::Snippet(t) => vec![t.path.as_bytes(), t.snippet.as_bytes()],
            ClaimPayload::Symbol(t) => vec![t.path.as_bytes(), t.symbol.as_bytes()],
            ClaimPayload::Assertion(t) => vec![
                t.form.as_str().as_bytes(),
                t.subject.as_bytes(),
                t.path.as_bytes(),
            ],
            ClaimPayload::Path(t) => vec![t.path.as_bytes()],
        }
    }
}

/// A typed, checkable assertion
///
/// Build claims with the kind-specific constructors; they keep `kind` and
/// `payload` consistent. Equality of *assertions* (ignoring where a claim was
/// phrased) is [`Claim::same_assertion`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    kind: ClaimKind,
    payload: ClaimPayload,
    #[serde(default)]
    source_text: Option<String>,
}

impl Claim {
    /// "path exists"
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::structured(
            ClaimKind::FileReference,
            ClaimPayload::Path(PathTarget { path: path.into() }),
        )
    }

    /// "function `symbol` is defined in `path`"
    #[must_use]
    pub fn function(path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::symbol(ClaimKind::FunctionReference, path, symbol)
    }

    /// "class `symbol` is defined in `path`"
    #[must_use]
    pub fn class(path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::symbol(ClaimKind::ClassReference, path, symbol)
    }

    /// "`path` imports `symbol`"
    #[must_use]
    pub fn import(path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::symbol(ClaimKind::ImportReference, path, symbol)
    }

    /// "`snippet` appears in `path`"
    #[must_use]
    pub fn snippet(path: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self::structured(
            ClaimKind::CodeSnippet,
            ClaimPayload::Snippet(SnippetTarget {
                path: path.into(),
                snippet: snippet.into(),
            }),
        )
    }

    /// Assertion lifted out of `source_text`
    #[must_use]
    pub fn assertion(assertion: TextAssertion, source_text: impl Into<String>) -> Self {
        Self {
            kind: ClaimKind::FreeTextAssertion,
            payload: ClaimPayload::Assertion(assertion),
            source_text: Some(source_text.into()),
        }
    }

    fn symbol(kind: ClaimKind, path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::structured(
            kind,
            ClaimPayload::Symbol(SymbolTarget {
                path: path.into(),
                symbol: symbol.into(),
            }),
        )
    }

    fn structured(kind: ClaimKind, payload: ClaimPayload) -> Self {
        Self {
            kind,
            payload,
            source_text: None,
        }
    }

    /// Claim kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ClaimKind {
        self.kind
    }

    /// Claim payload
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &ClaimPayload {
        &self.payload
    }

    /// Originating sentence, for free-text claims
    #[inline]
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    /// Path the claim refers to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        self.payload.path()
    }

    /// True if both claims assert the same thing (same kind and payload)
    #[inline]
    #[must_use]
    pub fn same_assertion(&self, other: &Claim) -> bool {
        self.kind == other.kind && self.payload == other.payload
    }

    /// Stable fingerprint of kind and payload
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fields = vec![self.kind.as_str().as_bytes()];
        fields.extend(self.payload.fields());
        Fingerprint::compute_fields(fields)
    }

    /// Required payload fields that are empty, or a kind/payload mismatch
    ///
    /// An empty result means the claim is well formed and can be checked.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let blank = |s: &str| s.trim().is_empty();

        match (&self.kind, &self.payload) {
            (ClaimKind::FileReference, ClaimPayload::Path(t)) => {
                if blank(&t.path) {
                    missing.push("path");
                }
            }
            (
                ClaimKind::FunctionReference | ClaimKind::ClassReference | ClaimKind::ImportReference,
                ClaimPayload::Symbol(t),
            ) => {
                if blank(&t.path) {
                    missing.push("path");
                }
                if blank(&t.symbol) {
                    missing.push("symbol");
                }
            }
            (ClaimKind::CodeSnippet, ClaimPayload::Snippet(t)) => {
                if blank(&t.path) {
                    missing.push("path");
                }
                if blank(&t.snippet) {
                    missing.push("snippet");
                }
            }
            (ClaimKind::FreeTextAssertion, ClaimPayload::Assertion(t)) => {
                if blank(&t.path) {
                    missing.push("path");
                }
                if blank(&t.subject) {
                    missing.push("subject");
                }
            }
            _ => missing.push("payload"),
        }

        missing
    }

    /// Canonical JSON encoding (used as the evidence record of a claim)
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        // Plain structs and strings: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Display for Claim {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.payload {
            ClaimPayload::Path(t) => write!(f, "{} {}", self.kind, t.path),
            ClaimPayload::Symbol(t) => write!(f, "{} {}:{}", self.kind, t.path, t.symbol),
            ClaimPayload::Snippet(t) => {
                let preview: String = t.snippet.chars().take(40).collect();
                write!(f, "{} {}:{preview:?}", self.kind, t.path)
            }
            ClaimPayload::Assertion(t) => {
                write!(f, "{} {} {} {}", self.kind, t.form.as_str(), t.subject, t.path)
            }
        }
    }
}
