// Parser module: the per-language extraction contract and its registry
//
// Each language implements `SourceParser`. Dispatch is static, by file name
// suffix; a file's content is never inspected to pick a parser.

pub mod ast;
mod javascript;
mod outline;
mod python;
pub mod walk;

pub use ast::*;
pub use javascript::{JavaScriptParser, JsVariant};
pub use python::PythonParser;
pub use walk::{discover_files, WalkOptions};

use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Language as Grammar, Node, Parser, Tree};

/// Contract every language extractor satisfies
pub trait SourceParser: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// File name suffixes owned by this parser, including the dot
    fn extensions(&self) -> &'static [&'static str];

    /// Parse one file. Failures are recorded in `ParsedFile::error`, never returned.
    fn parse_file(&self, path: &Path) -> ParsedFile;

    /// Backend selected for each language this parser handles
    fn backends(&self) -> Vec<(Language, &Backend)>;

    fn handles(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| walk::matches_extension(&n.to_string_lossy(), self.extensions()))
            .unwrap_or(false)
    }

    /// Parse every matching file under `root` with default walk options
    fn walk_directory(&self, root: &Path) -> Vec<ParsedFile> {
        self.walk_directory_with(root, &WalkOptions::default())
    }

    /// Parse every matching file under `root`. Output follows walk order even
    /// when parsing runs in parallel.
    fn walk_directory_with(&self, root: &Path, options: &WalkOptions) -> Vec<ParsedFile> {
        let paths = discover_files(root, self.extensions(), options);
        debug!(parser = self.name(), files = paths.len(), "walked {}", root.display());

        if options.parallel {
            paths.par_iter().map(|p| self.parse_file(p)).collect()
        } else {
            paths.iter().map(|p| self.parse_file(p)).collect()
        }
    }
}

/// Extraction strategy for one language, chosen once when the parser is built
#[derive(Clone)]
pub enum Backend {
    /// A working tree-sitter grammar
    TreeSitter(Grammar),
    /// Heuristic extraction without a syntax tree
    Fallback,
}

impl Backend {
    /// Use the grammar if a parser accepts it, otherwise lock in the fallback
    pub fn probe(label: &str, grammar: Grammar) -> Self {
        let mut parser = Parser::new();
        match parser.set_language(&grammar) {
            Ok(()) => Backend::TreeSitter(grammar),
            Err(e) => {
                warn!("{} grammar unavailable ({}), using heuristic fallback", label, e);
                Backend::Fallback
            }
        }
    }

    /// Probe the grammar only when tree-sitter is enabled
    pub fn select(label: &str, tree_sitter: bool, grammar: impl FnOnce() -> Grammar) -> Self {
        if tree_sitter {
            Self::probe(label, grammar())
        } else {
            debug!("{} tree-sitter disabled, using heuristic fallback", label);
            Backend::Fallback
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Backend::Fallback)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backend::TreeSitter(_) => "tree-sitter",
            Backend::Fallback => "fallback",
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Registry of parsers keyed by the suffixes they own
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SourceParser>>,
}

impl ParserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Python first, then JavaScript/TypeScript
    pub fn with_defaults(tree_sitter: bool) -> Self {
        Self {
            parsers: vec![
                Box::new(PythonParser::with_tree_sitter(tree_sitter)),
                Box::new(JavaScriptParser::with_tree_sitter(tree_sitter)),
            ],
        }
    }

    /// Add a parser. Every suffix must be unclaimed.
    pub fn register(&mut self, parser: Box<dyn SourceParser>) -> Result<()> {
        for ext in parser.extensions() {
            if let Some(owner) = self.parsers.iter().find(|p| p.extensions().contains(ext)) {
                return Err(Error::DuplicateExtension {
                    extension: ext.to_string(),
                    owner: owner.name().to_string(),
                });
            }
        }
        self.parsers.push(parser);
        Ok(())
    }

    pub fn parsers(&self) -> impl Iterator<Item = &dyn SourceParser> {
        self.parsers.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// The parser owning this file's suffix
    pub fn parser_for(&self, path: &Path) -> Option<&dyn SourceParser> {
        self.parsers().find(|p| p.handles(path))
    }

    /// Parse a single file if some parser owns it
    pub fn parse_file(&self, path: &Path) -> Option<ParsedFile> {
        self.parser_for(path).map(|p| p.parse_file(path))
    }

    /// Run every parser's walk in registration order and concatenate the results
    pub fn parse_directory(&self, root: &Path, options: &WalkOptions) -> Vec<ParsedFile> {
        let mut parsed = Vec::new();
        for parser in self.parsers() {
            parsed.extend(parser.walk_directory_with(root, options));
        }
        parsed
    }

    /// Backend in use for every registered language
    pub fn backends(&self) -> Vec<(Language, &Backend)> {
        self.parsers().flat_map(|p| p.backends()).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults(true)
    }
}

/// Build a syntax tree with a fresh parser
pub(crate) fn parse_tree(grammar: &Grammar, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| Error::parser(format!("Failed to set language: {}", e)))?;
    parser
        .parse(source, None)
        .ok_or_else(|| Error::parser("Failed to parse source"))
}

/// Get text content of a node
pub(crate) fn get_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Every call expression in the tree, in source order.
///
/// Uses an explicit stack so deeply nested generated code cannot overflow.
pub(crate) fn collect_calls(root: Node, call_kind: &str, source: &[u8]) -> Vec<Call> {
    let mut calls = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.kind() == call_kind {
            let target = node
                .child_by_field_name("function")
                .map(|callee| get_text(&callee, source).to_string())
                .filter(|text| !text.is_empty());
            calls.push(Call::new(target, Span::of(&node)));
        }

        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    calls
}

/// S-expression of the named nodes under `root`, with field labels.
///
/// Walks with a cursor instead of recursing, so deeply nested generated code
/// cannot overflow the stack.
pub(crate) fn sexp(root: Node) -> String {
    let mut out = String::new();
    let mut cursor = root.walk();
    // whether each entered ancestor wrote an opening paren
    let mut opened: Vec<bool> = Vec::new();

    loop {
        let node = cursor.node();
        let visible = node.is_named() || node.is_missing();
        if visible {
            if !out.is_empty() {
                out.push(' ');
            }
            if let Some(field) = cursor.field_name() {
                out.push_str(field);
                out.push_str(": ");
            }
            out.push('(');
            if node.is_missing() {
                if node.is_named() {
                    out.push_str(&format!("MISSING {}", node.kind()));
                } else {
                    out.push_str(&format!("MISSING \"{}\"", node.kind()));
                }
            } else {
                out.push_str(node.kind());
            }
        }

        if cursor.goto_first_child() {
            opened.push(visible);
            continue;
        }
        if visible {
            out.push(')');
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return out;
            }
            if opened.pop() == Some(true) {
                out.push(')');
            }
        }
    }
}

/// Docstring of a triple-quoted literal with quote characters stripped as-is
pub(crate) fn naive_docstring(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with("\"\"\"") || raw.starts_with("'''") {
        Some(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
    } else {
        None
    }
}

/// Absolute form of a path without resolving symlinks
pub(crate) fn absolute_path_string(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct StubParser {
        exts: &'static [&'static str],
    }

    impl SourceParser for StubParser {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn extensions(&self) -> &'static [&'static str] {
            self.exts
        }

        fn parse_file(&self, path: &Path) -> ParsedFile {
            ParsedFile::new(path.to_string_lossy(), Language::Python)
        }

        fn backends(&self) -> Vec<(Language, &Backend)> {
            Vec::new()
        }
    }

    #[test]
    fn test_naive_docstring() {
        assert_eq!(naive_docstring("\"\"\"Entry point.\"\"\""), Some("Entry point.".to_string()));
        assert_eq!(naive_docstring("'''\n  Multi\n  '''"), Some("\n  Multi\n  ".to_string()));
        assert_eq!(naive_docstring("\"single\""), None);
        assert_eq!(naive_docstring("x = 1"), None);
    }

    #[test]
    fn test_register_rejects_owned_extension() {
        let mut registry = ParserRegistry::with_defaults(false);
        let result = registry.register(Box::new(StubParser { exts: &[".pyi", ".py"] }));
        match result {
            Err(Error::DuplicateExtension { extension, owner }) => {
                assert_eq!(extension, ".py");
                assert_eq!(owner, "python");
            }
            other => panic!("expected duplicate extension error, got {:?}", other.err()),
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_new_extension() {
        let mut registry = ParserRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(StubParser { exts: &[".rb"] })).unwrap();
        assert!(registry.parser_for(Path::new("lib/app.rb")).is_some());
        assert!(registry.parser_for(Path::new("lib/app.py")).is_none());
    }

    #[test]
    fn test_parser_for_dispatches_by_suffix() {
        let registry = ParserRegistry::with_defaults(false);
        assert_eq!(registry.parser_for(Path::new("a/b.py")).unwrap().name(), "python");
        assert_eq!(registry.parser_for(Path::new("a/b.tsx")).unwrap().name(), "javascript");
        assert!(registry.parser_for(Path::new("a/b.md")).is_none());
        assert!(registry.parser_for(Path::new("a/py")).is_none());
    }

    #[test]
    fn test_fallback_backends() {
        let registry = ParserRegistry::with_defaults(false);
        let backends = registry.backends();
        assert!(!backends.is_empty());
        assert!(backends.iter().all(|(_, b)| b.is_fallback()));
    }

    #[test]
    fn test_tree_sitter_backends_available() {
        let registry = ParserRegistry::with_defaults(true);
        assert!(registry.backends().iter().all(|(_, b)| !b.is_fallback()));
    }

    #[test]
    fn test_parse_directory_orders_python_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), "function a() {}\n").unwrap();
        fs::write(dir.path().join("b.py"), "def b():\n    pass\n").unwrap();
        fs::write(dir.path().join("README.md"), "# hi\n").unwrap();

        let registry = ParserRegistry::with_defaults(true);
        let files = registry.parse_directory(dir.path(), &WalkOptions::default());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].language, Language::Python);
        assert_eq!(files[1].language, Language::JavaScript);
    }

    #[test]
    fn test_parallel_walk_preserves_order() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            fs::write(dir.path().join(format!("m{:02}.py", i)), format!("def f{}():\n    pass\n", i)).unwrap();
        }
        let parser = PythonParser::new();

        let mut serial = WalkOptions::default();
        serial.parallel = false;
        let a: Vec<String> = parser.walk_directory_with(dir.path(), &serial).into_iter().map(|f| f.path).collect();
        let b: Vec<String> = parser.walk_directory(dir.path()).into_iter().map(|f| f.path).collect();
        assert_eq!(a, b);
        assert!(a[0].ends_with("m00.py"));
    }

    #[test]
    fn test_collect_calls_finds_nested_calls() {
        let source = "def f():\n    if x:\n        g(h(1))\n";
        let grammar: Grammar = tree_sitter_python::LANGUAGE.into();
        let tree = parse_tree(&grammar, source).unwrap();
        let calls = collect_calls(tree.root_node(), "call", source.as_bytes());
        let targets: Vec<Option<String>> = calls.into_iter().map(|c| c.target).collect();
        assert_eq!(targets, vec![Some("g".to_string()), Some("h".to_string())]);
    }

    #[test]
    fn test_sexp_matches_tree_sitter_rendering() {
        let python: Grammar = tree_sitter_python::LANGUAGE.into();
        let source = "import os\n\nclass A:\n    def run(self, x=1):\n        return f(x)[0]\n";
        let tree = parse_tree(&python, source).unwrap();
        assert_eq!(sexp(tree.root_node()), tree.root_node().to_sexp());

        let javascript: Grammar = tree_sitter_javascript::LANGUAGE.into();
        let source = "const a = f(1);\nexport function g(b) { return a.map(x => x * b); }\n";
        let tree = parse_tree(&javascript, source).unwrap();
        assert_eq!(sexp(tree.root_node()), tree.root_node().to_sexp());
    }

    #[test]
    fn test_sexp_of_small_tree() {
        let python: Grammar = tree_sitter_python::LANGUAGE.into();
        let tree = parse_tree(&python, "x = f(1)\n").unwrap();
        assert_eq!(
            sexp(tree.root_node()),
            "(module (expression_statement (assignment left: (identifier) right: \
             (call function: (identifier) arguments: (argument_list (integer))))))"
        );
    }

    #[test]
    fn test_absolute_path_string() {
        let abs = absolute_path_string(&PathBuf::from("some/relative.py"));
        assert!(Path::new(&abs).is_absolute());
        assert!(abs.ends_with("relative.py"));
    }
}
