//! Structural outlines of source files
//!
//! A [`SourceOutline`] is the set of function, class and import names defined
//! in one file. Outlines are built from a tree-sitter parse for the languages
//! with a bundled grammar. Files without a grammar can be outlined with a
//! line-oriented definition scan, which is only used outside strict mode.

use crate::error::{GroundError, GroundResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tree_sitter::{Node, Tree};

/// Languages with a structural grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Python
    Python,
    /// Rust
    Rust,
    /// TypeScript
    TypeScript,
    /// TypeScript with JSX
    Tsx,
    /// JavaScript (parsed with the TypeScript grammar)
    JavaScript,
    /// Go
    Go,
}

impl Language {
    /// File extensions for this language
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Rust => &["rs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Tsx => &["tsx", "jsx"],
            Language::JavaScript => &["js", "mjs", "cjs"],
            Language::Go => &["go"],
        }
    }

    /// Detect language from file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        [
            Language::Python,
            Language::Rust,
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
            Language::Go,
        ]
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Detect language from a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Tree-sitter grammar
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::TypeScript | Language::JavaScript => {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::TypeScript => "TypeScript",
            Language::Tsx => "TSX",
            Language::JavaScript => "JavaScript",
            Language::Go => "Go",
        };
        f.write_str(name)
    }
}

/// Names defined in a source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutline {
    language: Option<Language>,
    functions: BTreeSet<String>,
    classes: BTreeSet<String>,
    imports: BTreeSet<String>,
}

impl SourceOutline {
    /// Parse `source` with the grammar for `language`
    ///
    /// # Errors
    /// Returns [`GroundError::Syntax`] if the tree contains any error node and
    /// [`GroundError::ParserInit`] if the grammar cannot be loaded.
    pub fn parse(path: &Path, source: &str, language: Language) -> GroundResult<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| GroundError::ParserInit(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| GroundError::ParserInit(format!("{language} parser returned no tree")))?;

        if let Some((line, column)) = first_error(&tree) {
            return Err(GroundError::Syntax {
                path: path.to_path_buf(),
                line,
                column,
            });
        }

        let mut outline = Self {
            language: Some(language),
            ..Self::default()
        };
        let src = source.as_bytes();
        for_each_node(tree.root_node(), |node| match language {
            Language::Python => outline.visit_python(node, src),
            Language::Rust => outline.visit_rust(node, src),
            Language::TypeScript | Language::Tsx | Language::JavaScript => {
                outline.visit_typescript(node, src);
            }
            Language::Go => outline.visit_go(node, src),
        });
        Ok(outline)
    }

    /// Outline a file without a grammar by scanning definition-like lines
    #[must_use]
    pub fn scan(source: &str) -> Self {
        let mut outline = Self::default();
        let Some(scanner) = LINE_SCANNER.as_ref() else {
            return outline;
        };

        for line in source.lines() {
            if let Some(caps) = scanner.function.captures(line) {
                outline.functions.insert(caps[1].to_string());
            }
            if let Some(caps) = scanner.class.captures(line) {
                outline.classes.insert(caps[1].to_string());
            }
            if let Some(caps) = scanner.import.captures(line) {
                for word in scanner.word.find_iter(&caps[1]) {
                    let word = word.as_str().trim_matches(|c| c == '.' || c == ':' || c == '/');
                    if !word.is_empty() && !IMPORT_KEYWORDS.contains(&word) {
                        outline.imports.insert(word.to_string());
                    }
                }
            }
        }
        outline
    }

    /// Grammar the outline came from, `None` for a line scan
    #[inline]
    #[must_use]
    pub fn language(&self) -> Option<Language> {
        self.language
    }

    /// Function and method names
    #[inline]
    #[must_use]
    pub fn functions(&self) -> &BTreeSet<String> {
        &self.functions
    }

    /// Class and type names
    #[inline]
    #[must_use]
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    /// Imported modules and names
    #[inline]
    #[must_use]
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// True if a function or method with exactly this name is defined
    #[inline]
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// True if a class with exactly this name is defined
    #[inline]
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    /// True if this module or name is imported
    #[inline]
    #[must_use]
    pub fn has_import(&self, name: &str) -> bool {
        self.imports.contains(name)
    }

    fn visit_python(&mut self, node: Node<'_>, src: &[u8]) {
        match node.kind() {
            "function_definition" => insert_field(&mut self.functions, node, "name", src),
            "class_definition" => insert_field(&mut self.classes, node, "name", src),
            "import_statement" | "import_from_statement" => {
                if let Some(module) = node.child_by_field_name("module_name") {
                    let module = text(module, src);
                    insert(&mut self.imports, module);
                    insert(&mut self.imports, module.trim_start_matches('.'));
                }
                let mut cursor = node.walk();
                let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
                for name in names {
                    let name = if name.kind() == "aliased_import" {
                        name.child_by_field_name("name").unwrap_or(name)
                    } else {
                        name
                    };
                    insert(&mut self.imports, text(name, src));
                }
            }
            _ => {}
        }
    }

    fn visit_rust(&mut self, node: Node<'_>, src: &[u8]) {
        match node.kind() {
            "function_item" | "function_signature_item" => {
                insert_field(&mut self.functions, node, "name", src);
            }
            "struct_item" | "enum_item" | "trait_item" | "union_item" | "type_item" => {
                insert_field(&mut self.classes, node, "name", src);
            }
            "extern_crate_declaration" => insert_field(&mut self.imports, node, "name", src),
            "use_declaration" => {
                let Some(argument) = node.child_by_field_name("argument") else {
                    return;
                };
                let full: String = text(argument, src).split_whitespace().collect();
                insert(&mut self.imports, &full);
                for_each_node(argument, |inner| {
                    if matches!(inner.kind(), "identifier" | "scoped_identifier") {
                        insert(&mut self.imports, text(inner, src));
                    }
                });
            }
            _ => {}
        }
    }

    fn visit_typescript(&mut self, node: Node<'_>, src: &[u8]) {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "method_definition"
            | "abstract_method_signature" => insert_field(&mut self.functions, node, "name", src),
            "variable_declarator" => {
                let is_function = node.child_by_field_name("value").is_some_and(|value| {
                    matches!(
                        value.kind(),
                        "arrow_function" | "function_expression" | "function" | "generator_function"
                    )
                });
                if is_function {
                    insert_field(&mut self.functions, node, "name", src);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                insert_field(&mut self.classes, node, "name", src);
            }
            "import_statement" => {
                if let Some(source) = node.child_by_field_name("source") {
                    insert(&mut self.imports, unquote(text(source, src)));
                }
                let mut cursor = node.walk();
                let clauses: Vec<Node<'_>> = node
                    .children(&mut cursor)
                    .filter(|child| child.kind() == "import_clause")
                    .collect();
                for clause in clauses {
                    for_each_node(clause, |inner| {
                        if inner.kind() == "identifier" {
                            insert(&mut self.imports, text(inner, src));
                        }
                    });
                }
            }
            _ => {}
        }
    }

    fn visit_go(&mut self, node: Node<'_>, src: &[u8]) {
        match node.kind() {
            "function_declaration" | "method_declaration" => {
                insert_field(&mut self.functions, node, "name", src);
            }
            "type_spec" | "type_alias" => insert_field(&mut self.classes, node, "name", src),
            "import_spec" => {
                if let Some(path) = node.child_by_field_name("path") {
                    let path = unquote(text(path, src));
                    insert(&mut self.imports, path);
                    insert(&mut self.imports, path.rsplit('/').next().unwrap_or(path));
                }
                if let Some(alias) = node.child_by_field_name("name") {
                    if alias.kind() == "package_identifier" {
                        insert(&mut self.imports, text(alias, src));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Visit `root` and every node below it in document order
fn for_each_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// 1-based position of the first error or missing node
fn first_error(tree: &Tree) -> Option<(usize, usize)> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut found = None;
    for_each_node(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            let pos = node.start_position();
            found = Some((pos.row + 1, pos.column + 1));
        }
    });
    // has_error() without a located node still means a bad tree
    Some(found.unwrap_or((1, 1)))
}

fn text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

fn insert(set: &mut BTreeSet<String>, name: &str) {
    if !name.is_empty() {
        set.insert(name.to_string());
    }
}

fn insert_field(set: &mut BTreeSet<String>, node: Node<'_>, field: &str, src: &[u8]) {
    if let Some(name) = node.child_by_field_name(field) {
        insert(set, text(name, src));
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Definition-like line patterns for files without a grammar
#[derive(Debug)]
struct LineScanner {
    function: Regex,
    class: Regex,
    import: Regex,
    word: Regex,
}

impl LineScanner {
    fn compile() -> Option<Self> {
        Some(Self {
            function: Regex::new(
                r"^\s*(?:(?:pub(?:\([^)]*\))?|export|default|public|private|protected|static|async|unsafe|const)\s+)*(?:def|fn|func|function|sub|proc)\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)",
            )
            .ok()?,
            class: Regex::new(
                r"^\s*(?:(?:pub(?:\([^)]*\))?|export|default|public|private|abstract|final|sealed|data)\s+)*(?:class|struct|enum|trait|interface|union|type|module)\s+([A-Za-z_]\w*)",
            )
            .ok()?,
            import: Regex::new(r"^\s*(?:import|from|use|require|using|#include|extern\s+crate)\b(.*)$")
                .ok()?,
            word: Regex::new(r"[A-Za-z_][\w./:-]*").ok()?,
        })
    }
}

static LINE_SCANNER: Lazy<Option<LineScanner>> = Lazy::new(LineScanner::compile);

const IMPORT_KEYWORDS: &[&str] = &["import", "from", "as", "use", "require", "using", "crate"];
