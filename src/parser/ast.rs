// Structural records extracted from source files
//
// Every language extractor produces the same shape so that the graph builder
// and renderers never need to know which grammar (or fallback) was used.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language of a parsed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Detect language from a file name, by suffix only
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".py") {
            Some(Self::Python)
        } else if name.ends_with(".ts") || name.ends_with(".tsx") {
            Some(Self::TypeScript)
        } else if name.ends_with(".js") || name.ends_with(".jsx") {
            Some(Self::JavaScript)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-based (row, column) start and end points of a construct.
///
/// Serialized as `[[row, col], [row, col]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span(pub (usize, usize), pub (usize, usize));

impl Span {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self(start, end)
    }

    /// Span covered by a syntax tree node
    pub fn of(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self((start.row, start.column), (end.row, end.column))
    }

    pub fn start(&self) -> (usize, usize) {
        self.0
    }

    pub fn end(&self) -> (usize, usize) {
        self.1
    }
}

/// Structural facts for one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedFile {
    /// Absolute path after parsing, repo-relative after normalization
    #[serde(rename = "file")]
    pub path: String,
    pub language: Language,
    /// Raw syntax tree representation, if one was built
    pub ast: Option<String>,
    /// Raw import/export statement text, never decomposed
    pub imports: Vec<String>,
    /// Top-level functions only
    pub functions: Vec<Function>,
    /// Top-level classes only
    pub classes: Vec<Class>,
    /// Every call expression in the file, in source order
    pub calls: Vec<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParsedFile {
    pub fn new(path: impl Into<String>, language: Language) -> Self {
        Self {
            path: path.into(),
            language,
            ast: None,
            imports: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            calls: Vec::new(),
            error: None,
        }
    }

    /// A record for a file that could not be parsed: structural fields stay empty
    pub fn failed(path: impl Into<String>, language: Language, error: impl Into<String>) -> Self {
        let mut file = Self::new(path, language);
        file.error = Some(error.into());
        file
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if the file defines or references nothing
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.functions.is_empty()
            && self.classes.is_empty()
            && self.calls.is_empty()
    }
}

/// A function or method definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    pub name: String,
    /// Parameters as written, in order
    pub args: Vec<String>,
    pub docstring: Option<String>,
    pub span: Option<Span>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            docstring: None,
            span: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// A class definition with its methods (one level deep)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Class {
    pub name: String,
    pub docstring: Option<String>,
    pub methods: Vec<Function>,
    pub span: Option<Span>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docstring: None,
            methods: Vec::new(),
            span: None,
        }
    }

    pub fn method(&self, name: &str) -> Option<&Function> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A call site. The target is the callee text, never resolved to a definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    pub target: Option<String>,
    pub span: Span,
}

impl Call {
    pub fn new(target: Option<String>, span: Span) -> Self {
        Self { target, span }
    }
}
