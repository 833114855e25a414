//! Fact extraction
//!
//! Turns a [`WorkerOutput`] into an ordered list of [`Claim`]s: structured
//! references first (files, functions, classes, imports, snippets, in that
//! order), then assertions recognised in the analysis text, ordered by where
//! they occur. Extraction is a pure function of its input.

use crate::claim::{AssertionForm, Claim, TextAssertion};
use crate::output::WorkerOutput;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Sentence shapes recognised in free text, with the capture group holding
/// the subject and the one holding the path.
const ASSERTION_PATTERNS: &[(&str, AssertionForm, usize, usize)] = &[
    (
        r"(?i)\bfile\s+`?([^\s`]+)`?\s+contains\s+`?(\w+)`?",
        AssertionForm::FileContains,
        2,
        1,
    ),
    (
        r"(?i)\bfunction\s+`?(\w+)`?\s+in\s+`?([^\s`]+)`?",
        AssertionForm::FunctionIn,
        1,
        2,
    ),
    (
        r"(?i)\bimport\s+`?(\w+)`?\s+from\s+`?([^\s`]+)`?",
        AssertionForm::ImportFrom,
        1,
        2,
    ),
    (
        r"(?i)\bclass\s+`?(\w+)`?\s+in\s+`?([^\s`]+)`?",
        AssertionForm::ClassIn,
        1,
        2,
    ),
];

struct CompiledPattern {
    regex: Regex,
    form: AssertionForm,
    subject_group: usize,
    path_group: usize,
}

static COMPILED: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    ASSERTION_PATTERNS
        .iter()
        .filter_map(|&(pattern, form, subject_group, path_group)| {
            Regex::new(pattern).ok().map(|regex| CompiledPattern {
                regex,
                form,
                subject_group,
                path_group,
            })
        })
        .collect()
});

/// Extracts typed claims from worker output
#[derive(Debug, Clone, Copy, Default)]
pub struct FactExtractor;

impl FactExtractor {
    /// Create extractor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract every claim from the output
    #[must_use]
    pub fn extract(&self, output: &WorkerOutput) -> Vec<Claim> {
        let mut claims: Vec<Claim> = output.files.iter().map(Claim::file).collect();

        claims.extend(output.functions.iter().map(|f| {
            Claim::function(
                f.file.clone().unwrap_or_default(),
                f.function.clone().unwrap_or_default(),
            )
        }));
        claims.extend(output.classes.iter().map(|c| {
            Claim::class(
                c.file.clone().unwrap_or_default(),
                c.class_name.clone().unwrap_or_default(),
            )
        }));
        claims.extend(output.imports.iter().map(|i| {
            Claim::import(
                i.file.clone().unwrap_or_default(),
                i.import.clone().unwrap_or_default(),
            )
        }));
        claims.extend(output.snippets.iter().map(|s| {
            Claim::snippet(
                s.file.clone().unwrap_or_default(),
                s.snippet.clone().unwrap_or_default(),
            )
        }));

        if let Some(analysis) = output.analysis.as_deref() {
            claims.extend(self.extract_from_text(analysis));
        }

        claims
    }

    /// Extract assertions from free text, ordered by match position
    #[must_use]
    pub fn extract_from_text(&self, text: &str) -> Vec<Claim> {
        let mut found: Vec<(usize, Claim)> = Vec::new();

        for pattern in COMPILED.iter() {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let subject = group(&caps, pattern.subject_group);
                let path = clean_path(group(&caps, pattern.path_group));
                if subject.is_empty() || path.is_empty() {
                    continue;
                }

                let assertion = TextAssertion {
                    form: pattern.form,
                    subject: subject.to_string(),
                    path: path.to_string(),
                };
                let sentence = sentence_around(text, whole.start(), whole.end());
                found.push((whole.start(), Claim::assertion(assertion, sentence)));
            }
        }

        // Stable: equal positions keep pattern-table order.
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, claim)| claim).collect()
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Strip quoting and sentence punctuation captured along with a path
fn clean_path(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'))
        .trim_start_matches('(')
}

fn is_terminator(text: &str, idx: usize) -> bool {
    let bytes = text.as_bytes();
    match bytes[idx] {
        b'\n' => true,
        b'.' | b'!' | b'?' => bytes
            .get(idx + 1)
            .map_or(true, |next| next.is_ascii_whitespace()),
        _ => false,
    }
}

/// The sentence containing `start..end`
///
/// A sentence ends at a newline or at `.`/`!`/`?` followed by whitespace, so
/// dots inside file names do not split it.
#[must_use]
pub fn sentence_around(text: &str, start: usize, end: usize) -> String {
    let begin = (0..start)
        .rev()
        .find(|&i| is_terminator(text, i))
        .map_or(0, |i| i + 1);
    let finish = (end..text.len())
        .find(|&i| is_terminator(text, i))
        .map_or(text.len(), |i| if text.as_bytes()[i] == b'\n' { i } else { i + 1 });

    text[begin..finish].trim().to_string()
}
