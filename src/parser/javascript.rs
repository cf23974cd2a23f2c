// JavaScript/TypeScript parser using tree-sitter, with a line heuristic fallback

use super::{
    absolute_path_string, collect_calls, get_text, parse_tree, sexp, Backend, SourceParser,
};
use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Language as Grammar, Node};

/// Supported JavaScript variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsVariant {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

impl JsVariant {
    /// Detect variant from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Check if this is a TypeScript variant
    pub fn is_typescript(&self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }

    pub fn language(&self) -> Language {
        if self.is_typescript() {
            Language::TypeScript
        } else {
            Language::JavaScript
        }
    }
}

/// Parser for JavaScript/TypeScript source files.
///
/// Each grammar has its own backend, so TSX can fall back while plain
/// JavaScript still gets a syntax tree.
pub struct JavaScriptParser {
    js: Backend,
    ts: Backend,
    tsx: Backend,
}

impl JavaScriptParser {
    /// Create a new JavaScript/TypeScript parser
    pub fn new() -> Self {
        Self::with_tree_sitter(true)
    }

    pub fn with_tree_sitter(enabled: bool) -> Self {
        Self {
            js: Backend::select("javascript", enabled, || tree_sitter_javascript::LANGUAGE.into()),
            ts: Backend::select("typescript", enabled, || {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }),
            tsx: Backend::select("tsx", enabled, || tree_sitter_typescript::LANGUAGE_TSX.into()),
        }
    }

    /// Create a parser locked into the line heuristic
    pub fn fallback() -> Self {
        Self::with_tree_sitter(false)
    }

    pub fn backend_for(&self, variant: JsVariant) -> &Backend {
        match variant {
            JsVariant::JavaScript | JsVariant::Jsx => &self.js,
            JsVariant::TypeScript => &self.ts,
            JsVariant::Tsx => &self.tsx,
        }
    }

    /// Parse JavaScript/TypeScript source code
    pub fn parse_source(
        &self,
        source: &str,
        path: impl Into<String>,
        variant: JsVariant,
    ) -> Result<ParsedFile> {
        let file = ParsedFile::new(path, variant.language());
        match self.backend_for(variant) {
            Backend::TreeSitter(grammar) => parse_with_tree(grammar, source, file),
            Backend::Fallback => Ok(parse_with_heuristic(source, file)),
        }
    }
}

impl Default for JavaScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for JavaScriptParser {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".js", ".jsx", ".ts", ".tsx"]
    }

    fn parse_file(&self, path: &Path) -> ParsedFile {
        let file = absolute_path_string(path);
        let Some(variant) = JsVariant::from_path(path) else {
            let language = Language::from_file_name(&file).unwrap_or(Language::JavaScript);
            return ParsedFile::failed(file, language, "unknown JavaScript extension");
        };

        let result = std::fs::read_to_string(path)
            .map_err(|e| Error::parse(path, e.to_string()))
            .and_then(|source| self.parse_source(&source, file.clone(), variant));

        match result {
            Ok(parsed) => {
                debug!(
                    backend = self.backend_for(variant).kind(),
                    functions = parsed.functions.len(),
                    classes = parsed.classes.len(),
                    "parsed {}",
                    file
                );
                parsed
            }
            Err(e) => {
                warn!("{}", e);
                ParsedFile::failed(file, variant.language(), e.to_string())
            }
        }
    }

    fn backends(&self) -> Vec<(Language, &Backend)> {
        vec![
            (Language::JavaScript, &self.js),
            (Language::TypeScript, &self.ts),
            (Language::TypeScript, &self.tsx),
        ]
    }
}

fn parse_with_tree(grammar: &Grammar, source: &str, mut file: ParsedFile) -> Result<ParsedFile> {
    let tree = parse_tree(grammar, source)?;
    let root = tree.root_node();
    let bytes = source.as_bytes();

    file.imports = line_imports(source);

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        visit_top_level(&child, bytes, &mut file);
    }

    file.calls = collect_calls(root, "call_expression", bytes);
    file.ast = Some(sexp(root));
    Ok(file)
}

/// Record top-level functions and classes, looking through `export`
fn visit_top_level(node: &Node, source: &[u8], file: &mut ParsedFile) {
    match node.kind() {
        "export_statement" => {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                visit_top_level(&declaration, source, file);
            } else if let Some(value) = node.child_by_field_name("value") {
                // `export default class Foo {}` may parse as a named expression
                match value.kind() {
                    "class" => file.classes.extend(parse_class(&value, source)),
                    "function_expression" | "function" => {
                        file.functions.extend(parse_function(&value, source))
                    }
                    _ => {}
                }
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(func) = parse_function(node, source) {
                file.functions.push(func);
            }
        }
        "class_declaration" | "abstract_class_declaration" => {
            if let Some(class) = parse_class(node, source) {
                file.classes.push(class);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            file.functions.extend(parse_function_bindings(node, source));
        }
        _ => {}
    }
}

/// Parse a function declaration or method definition
fn parse_function(node: &Node, source: &[u8]) -> Option<Function> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())
        .filter(|n| !n.is_empty())?;

    Some(
        Function::new(name)
            .with_args(parse_parameters(node, source))
            .with_span(Span::of(node)),
    )
}

/// Functions bound to variables: `const foo = () => {}` or `let bar = function () {}`
fn parse_function_bindings(node: &Node, source: &[u8]) -> Vec<Function> {
    let mut functions = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let (Some(name), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            continue;
        };
        if matches!(
            value.kind(),
            "arrow_function" | "function_expression" | "function" | "generator_function"
        ) {
            functions.push(
                Function::new(get_text(&name, source))
                    .with_args(parse_parameters(&value, source))
                    .with_span(Span::of(node)),
            );
        }
    }
    functions
}

/// Parse a class declaration and its methods
fn parse_class(node: &Node, source: &[u8]) -> Option<Class> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())
        .filter(|n| !n.is_empty())?;

    let mut class = Class::new(name);
    class.span = Some(Span::of(node));

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "method_definition" {
                if let Some(method) = parse_function(&child, source) {
                    class.methods.push(method);
                }
            }
        }
    }

    Some(class)
}

/// Parameter text as written; a bare arrow parameter counts as one
fn parse_parameters(node: &Node, source: &[u8]) -> Vec<String> {
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        return params
            .named_children(&mut cursor)
            .filter(|p| p.kind() != "comment")
            .map(|p| get_text(&p, source).trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }

    node.child_by_field_name("parameter")
        .map(|p| vec![get_text(&p, source).to_string()])
        .unwrap_or_default()
}

/// Every trimmed line starting with `import ` or `export `
fn line_imports(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("import ") || line.starts_with("export "))
        .map(str::to_string)
        .collect()
}

/// Line-oriented extraction. Lossy: no methods, calls, docstrings or spans,
/// and any `const` line holding `=>` is taken for a function.
fn parse_with_heuristic(source: &str, mut file: ParsedFile) -> ParsedFile {
    file.imports = line_imports(source);

    for line in source.lines() {
        let stripped = line.trim();
        let second_token = || stripped.split_whitespace().nth(1);

        if stripped.starts_with("function ") || (stripped.starts_with("const ") && stripped.contains("=>")) {
            if let Some(token) = second_token() {
                let name = token.split('(').next().unwrap_or("").replace('=', "");
                if !name.is_empty() {
                    file.functions.push(Function::new(name));
                }
            }
        }

        if stripped.starts_with("class ") {
            if let Some(token) = second_token() {
                let name = token.split('{').next().unwrap_or("");
                if !name.is_empty() {
                    file.classes.push(Class::new(name));
                }
            }
        }
    }

    file.ast = Some("js-ast-fallback".to_string());
    file
}
