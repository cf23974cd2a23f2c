// Python parser using tree-sitter, with an outline-scan fallback

use super::outline;
use super::{
    absolute_path_string, collect_calls, get_text, naive_docstring, parse_tree, sexp, Backend,
    SourceParser,
};
use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Language as Grammar, Node};

/// Parser for Python source files
pub struct PythonParser {
    backend: Backend,
}

impl PythonParser {
    /// Create a parser, falling back to the outline scan if the grammar is unusable
    pub fn new() -> Self {
        Self::with_tree_sitter(true)
    }

    pub fn with_tree_sitter(enabled: bool) -> Self {
        let backend = Backend::select("python", enabled, || tree_sitter_python::LANGUAGE.into());
        Self { backend }
    }

    /// Create a parser locked into the outline scan
    pub fn fallback() -> Self {
        Self::with_tree_sitter(false)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Parse Python source code
    pub fn parse_source(&self, source: &str, path: impl Into<String>) -> Result<ParsedFile> {
        let path = path.into();
        match &self.backend {
            Backend::TreeSitter(grammar) => parse_with_tree(grammar, source, path),
            Backend::Fallback => parse_with_outline(source, path),
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for PythonParser {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn parse_file(&self, path: &Path) -> ParsedFile {
        let file = absolute_path_string(path);

        // Undecodable bytes are replaced rather than failing the file
        let source = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("cannot read {}: {}", file, e);
                return ParsedFile::failed(file, Language::Python, e.to_string());
            }
        };

        match self.parse_source(&source, file.clone()) {
            Ok(parsed) => {
                debug!(
                    backend = self.backend.kind(),
                    functions = parsed.functions.len(),
                    classes = parsed.classes.len(),
                    "parsed {}",
                    file
                );
                parsed
            }
            Err(e) => {
                warn!("{}", e);
                ParsedFile::failed(file, Language::Python, e.to_string())
            }
        }
    }

    fn backends(&self) -> Vec<(Language, &Backend)> {
        vec![(Language::Python, &self.backend)]
    }
}

fn parse_with_tree(grammar: &Grammar, source: &str, path: String) -> Result<ParsedFile> {
    let tree = parse_tree(grammar, source)?;
    let root = tree.root_node();
    let bytes = source.as_bytes();
    let mut file = ParsedFile::new(path, Language::Python);

    if root.has_error() {
        debug!("syntax errors in {}, extracting what parsed", file.path);
    }

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                file.imports.push(get_text(&child, bytes).trim().to_string());
            }
            _ => {
                let definition = unwrap_decorated(child);
                match definition.kind() {
                    "function_definition" => {
                        if let Some(func) = parse_function(&definition, bytes) {
                            file.functions.push(func);
                        }
                    }
                    "class_definition" => {
                        if let Some(class) = parse_class(&definition, bytes) {
                            file.classes.push(class);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    file.calls = collect_calls(root, "call", bytes);
    file.ast = Some(sexp(root));
    Ok(file)
}

fn parse_with_outline(source: &str, path: String) -> Result<ParsedFile> {
    let found = outline::outline(source).map_err(|message| Error::parse(&path, message))?;

    let mut file = ParsedFile::new(path, Language::Python);
    file.imports = found.imports;
    file.functions = found.functions;
    file.classes = found.classes;
    file.ast = Some("python-ast-fallback".to_string());
    Ok(file)
}

/// The definition inside a decorated definition, or the node itself
fn unwrap_decorated(node: Node) -> Node {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Parse a function definition
fn parse_function(node: &Node, source: &[u8]) -> Option<Function> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())
        .filter(|n| !n.is_empty())?;

    let mut func = Function::new(name)
        .with_args(parse_parameters(node, source))
        .with_span(Span::of(node));
    func.docstring = node
        .child_by_field_name("body")
        .and_then(|body| body_docstring(&body, source));

    Some(func)
}

/// Parse a class definition and its methods
fn parse_class(node: &Node, source: &[u8]) -> Option<Class> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())
        .filter(|n| !n.is_empty())?;

    let mut class = Class::new(name);
    class.span = Some(Span::of(node));

    if let Some(body) = node.child_by_field_name("body") {
        class.docstring = body_docstring(&body, source);

        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let definition = unwrap_decorated(child);
            if definition.kind() == "function_definition" {
                if let Some(method) = parse_function(&definition, source) {
                    class.methods.push(method);
                }
            }
        }
    }

    Some(class)
}

/// Parameter text as written: `self`, `x: int`, `y=3`, `*args`
fn parse_parameters(node: &Node, source: &[u8]) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "comment")
        .map(|p| get_text(&p, source).trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Docstring from the first statement of a block
fn body_docstring(body: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| !n.is_extra() && n.kind() != "comment")?;

    if first.kind() != "expression_statement" {
        return None;
    }
    naive_docstring(get_text(&first, source))
}
