//! Worker output record
//!
//! The structured document a code-generation worker hands over for
//! verification. Every field is optional; reference entries may be partially
//! filled, in which case the extracted claim is malformed and ends up
//! unverified rather than failing the whole document.
//!
//! List entries are read leniently: an entry of the wrong JSON type (a `null`
//! path, a numeric class name, a bare number where an object belongs) loses
//! the offending fields instead of rejecting the document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field names that are never scanned as free text
const NON_TEXT_FIELDS: &[&str] = &["agent", "timestamp"];

/// Output produced by a worker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerOutput {
    /// Paths claimed to exist; a non-string entry becomes an empty path
    #[serde(default, deserialize_with = "lenient_list")]
    pub files: Vec<String>,

    /// Function references
    #[serde(default, deserialize_with = "lenient_list")]
    pub functions: Vec<FunctionRef>,

    /// Class references
    #[serde(default, deserialize_with = "lenient_list")]
    pub classes: Vec<ClassRef>,

    /// Import references
    #[serde(default, deserialize_with = "lenient_list")]
    pub imports: Vec<ImportRef>,

    /// Code snippet references
    #[serde(default, alias = "code_snippets", deserialize_with = "lenient_list")]
    pub snippets: Vec<SnippetRef>,

    /// Free-text analysis
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub analysis: Option<String>,

    /// Any other fields; string values are scanned as free text
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl WorkerOutput {
    /// Create empty output
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With analysis text
    #[must_use]
    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = Some(analysis.into());
        self
    }

    /// With a claimed file
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// With a function reference
    #[must_use]
    pub fn with_function(mut self, file: impl Into<String>, function: impl Into<String>) -> Self {
        self.functions.push(FunctionRef::new(file, function));
        self
    }

    /// With a class reference
    #[must_use]
    pub fn with_class(mut self, file: impl Into<String>, class: impl Into<String>) -> Self {
        self.classes.push(ClassRef {
            file: Some(file.into()),
            class_name: Some(class.into()),
        });
        self
    }

    /// With an import reference
    #[must_use]
    pub fn with_import(mut self, file: impl Into<String>, import: impl Into<String>) -> Self {
        self.imports.push(ImportRef {
            file: Some(file.into()),
            import: Some(import.into()),
        });
        self
    }

    /// With a snippet reference
    #[must_use]
    pub fn with_snippet(mut self, file: impl Into<String>, snippet: impl Into<String>) -> Self {
        self.snippets.push(SnippetRef {
            file: Some(file.into()),
            snippet: Some(snippet.into()),
        });
        self
    }

    /// Every free-text field, `analysis` first, then other string fields in key order
    #[must_use]
    pub fn free_text_fields(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self.analysis.as_deref().into_iter().collect();
        texts.extend(
            self.extra
                .iter()
                .filter(|(key, _)| !NON_TEXT_FIELDS.contains(&key.as_str()))
                .filter_map(|(_, value)| value.as_str()),
        );
        texts
    }
}

/// `{file, function}` reference
///
/// Also accepts the legacy string form `"path:function"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionRef {
    /// File path
    pub file: Option<String>,
    /// Function name
    pub function: Option<String>,
}

impl FunctionRef {
    /// Create fully populated reference
    #[must_use]
    pub fn new(file: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            function: Some(function.into()),
        }
    }

    /// Parse `"path:function"`; text without a colon names only the function
    #[must_use]
    pub fn parse_legacy(text: &str) -> Self {
        match text.rsplit_once(':') {
            Some((file, function)) => Self {
                file: Some(file.to_string()),
                function: Some(function.to_string()),
            },
            None => Self {
                file: None,
                function: Some(text.to_string()),
            },
        }
    }
}

/// `{file, class}` reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassRef {
    /// File path
    pub file: Option<String>,
    /// Class name
    #[serde(rename = "class")]
    pub class_name: Option<String>,
}

/// `{file, import}` reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportRef {
    /// File path
    pub file: Option<String>,
    /// Imported symbol or module
    pub import: Option<String>,
}

/// `{file, snippet}` reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnippetRef {
    /// File path
    pub file: Option<String>,
    /// Code text
    pub snippet: Option<String>,
}

/// One list entry read from any JSON value
trait FromEntry: Sized {
    fn from_entry(value: Value) -> Self;
}

impl FromEntry for String {
    fn from_entry(value: Value) -> Self {
        match value {
            Value::String(s) => s,
            _ => String::new(),
        }
    }
}

impl FromEntry for FunctionRef {
    fn from_entry(value: Value) -> Self {
        match value {
            Value::String(s) => Self::parse_legacy(&s),
            Value::Object(map) => Self {
                file: text_field(&map, "file"),
                function: text_field(&map, "function"),
            },
            _ => Self::default(),
        }
    }
}

impl FromEntry for ClassRef {
    fn from_entry(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                file: text_field(&map, "file"),
                class_name: text_field(&map, "class"),
            },
            _ => Self::default(),
        }
    }
}

impl FromEntry for ImportRef {
    fn from_entry(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                file: text_field(&map, "file"),
                import: text_field(&map, "import"),
            },
            _ => Self::default(),
        }
    }
}

impl FromEntry for SnippetRef {
    fn from_entry(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                file: text_field(&map, "file"),
                snippet: text_field(&map, "snippet"),
            },
            _ => Self::default(),
        }
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(ToString::to_string)
}

/// A list whose entries never fail; `null` is an empty list and any other
/// non-array value is a single entry
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromEntry,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(T::from_entry).collect(),
        other => vec![T::from_entry(other)],
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}
