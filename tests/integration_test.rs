// Integration tests for docgraph

use docgraph::analysis::{EdgeKind, NodeKind};
use docgraph::config::OutputFormat;
use docgraph::history::HistoryOptions;
use docgraph::parser::{Language, PythonParser, JavaScriptParser, WalkOptions};
use docgraph::{
    build_graph, describe_repo, Analyzer, Config, DiagramGenerator, ParserRegistry, SourceParser,
};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

// Helper to create an analyzer with default config
fn create_analyzer() -> Analyzer {
    Analyzer::new(Config::default()).expect("Failed to create analyzer")
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn mixed_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pkg/solution.py",
        r#"import math

class Solution(object):
    def twoSum(self, nums, target):
        """
        :type nums: List[int]
        """
        for i, j in enumerate(nums):
            pass

def main():
    print(Solution().twoSum([1, 2], 3))
"#,
    );
    write(
        dir.path(),
        "web/app.js",
        r#"import React from 'react';

export function render(root) {
  mount(root);
}

class Store {
  get() { return fetch('/api'); }
}
"#,
    );
    write(
        dir.path(),
        "web/types.ts",
        "export const double = (n: number): number => n * 2;\n",
    );
    write(dir.path(), "node_modules/dep/index.js", "function vendored() {}\n");
    write(dir.path(), "README.md", "# project\n");
    dir
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(root)
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("git runs");
    assert!(status.status.success(), "git {:?} failed", args);
}

// ============================================================================
// Parsing Tests
// ============================================================================

#[test]
fn test_registry_parses_all_languages() {
    let dir = mixed_project();
    let registry = ParserRegistry::default();
    let files = registry.parse_directory(dir.path(), &WalkOptions::default());

    let languages: Vec<Language> = files.iter().map(|f| f.language).collect();
    assert_eq!(
        languages,
        vec![
            Language::Python,
            Language::JavaScript,
            Language::JavaScript,
            Language::TypeScript
        ]
    );
    assert!(files[1].path.ends_with("node_modules/dep/index.js"));
    assert!(files.iter().all(|f| Path::new(&f.path).is_absolute()));
}

#[test]
fn test_two_sum_on_both_backends() {
    let dir = mixed_project();
    let path = dir.path().join("pkg/solution.py");

    for parser in [PythonParser::new(), PythonParser::fallback()] {
        let parsed = parser.parse_file(&path);
        assert!(parsed.error.is_none());
        let class = &parsed.classes[0];
        assert_eq!(class.name, "Solution");
        let method = class.method("twoSum").expect("method");
        assert_eq!(method.args, vec!["self", "nums", "target"]);
        assert_eq!(parsed.functions[0].name, "main");
    }
}

#[test]
fn test_walk_visits_dependency_directories() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/x/a.js", "function a() {}\n");
    write(dir.path(), "venv/b.py", "def b():\n    pass\n");

    let js = JavaScriptParser::new().walk_directory(dir.path());
    assert_eq!(js.len(), 1);
    assert_eq!(js[0].functions[0].name, "a");

    let py = PythonParser::new().walk_directory(dir.path());
    assert_eq!(py.len(), 1);
    assert_eq!(py[0].functions[0].name, "b");
}

#[test]
fn test_walk_only_returns_owned_extensions() {
    let dir = mixed_project();
    let parser = JavaScriptParser::new();
    let files = parser.walk_directory(dir.path());
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| parser.handles(Path::new(&f.path))));
}

#[test]
fn test_parsing_is_idempotent() {
    let dir = mixed_project();
    let registry = ParserRegistry::default();
    let first = registry.parse_directory(dir.path(), &WalkOptions::default());
    let second = registry.parse_directory(dir.path(), &WalkOptions::default());
    assert_eq!(first, second);
}

#[test]
fn test_fallback_parsers_emit_no_calls_or_spans() {
    let dir = mixed_project();
    let registry = ParserRegistry::with_defaults(false);
    let files = registry.parse_directory(dir.path(), &WalkOptions::default());

    for file in &files {
        assert!(file.calls.is_empty(), "{}", file.path);
        assert!(file.functions.iter().all(|f| f.span.is_none()));
        assert!(file.classes.iter().all(|c| c.span.is_none()));
    }
    let js = files.iter().find(|f| f.path.ends_with("app.js")).unwrap();
    assert!(js.functions.iter().all(|f| f.docstring.is_none()));
    assert_eq!(js.classes[0].name, "Store");
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_analyze_mixed_project() {
    let dir = mixed_project();
    let result = create_analyzer().analyze(dir.path()).expect("Analysis failed");

    let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "pkg/solution.py",
            "node_modules/dep/index.js",
            "web/app.js",
            "web/types.ts"
        ]
    );

    let graph = &result.graph;
    assert!(graph.node("pkg/solution.py::class::Solution").is_some());
    assert!(graph.node("pkg/solution.py::func::main").is_some());
    assert!(graph.node("web/app.js::func::render").is_some());
    assert!(graph.node("web/app.js::class::Store").is_some());
    assert!(graph.node("web/types.ts::func::double").is_some());

    let stats = graph.stats();
    assert_eq!(stats.defines, stats.functions + stats.classes);
    assert_eq!(stats.commits, 0);

    let call_targets: Vec<&str> = graph
        .edges_of(EdgeKind::Calls)
        .map(|e| e.target.as_str())
        .collect();
    assert!(call_targets.contains(&"enumerate"));
    assert!(call_targets.contains(&"mount"));
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let result = create_analyzer().analyze(dir.path()).unwrap();

    assert!(result.files.is_empty());
    assert!(result.graph.is_empty());
    assert_eq!(DiagramGenerator::new().render_graph(&result.graph), "graph TD");
}

#[test]
fn test_deeply_nested_file_does_not_abort() {
    let dir = TempDir::new().unwrap();
    let depth = 20_000;
    write(
        dir.path(),
        "deep.py",
        &format!("x = {}1{}\n", "f(".repeat(depth), ")".repeat(depth)),
    );
    write(
        dir.path(),
        "deep.js",
        &format!("g({}0{});\n", "h(".repeat(depth), ")".repeat(depth)),
    );
    write(dir.path(), "ok.py", "def ok():\n    pass\n");

    let result = create_analyzer().analyze(dir.path()).unwrap();
    assert_eq!(result.stats.files, 3);
    assert_eq!(result.stats.calls, 2 * depth + 1);
    assert!(result.graph.node("ok.py::func::ok").is_some());
}

#[test]
fn test_directory_without_git_has_empty_history() {
    let dir = mixed_project();
    let history = describe_repo(dir.path(), &HistoryOptions::default());
    assert!(history.commits.is_empty());
    assert!(history.hotspots.is_empty());

    let result = create_analyzer().analyze(dir.path()).unwrap();
    assert_eq!(result.graph.nodes_of(NodeKind::Commit).count(), 0);
}

#[test]
fn test_identical_imports_are_separate_edges() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "import os\n");
    write(dir.path(), "b.py", "import os\n");

    let result = create_analyzer().analyze(dir.path()).unwrap();
    let imports: Vec<_> = result.graph.edges_of(EdgeKind::Imports).collect();
    assert_eq!(imports.len(), 2);
    assert!(imports.iter().all(|e| e.target == "import os"));
    assert_eq!(result.graph.nodes.len(), 2);
}

#[test]
fn test_unparseable_file_does_not_abort() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.py", "def good():\n    pass\n");
    write(dir.path(), "plain.js", "function ok() {}\n");
    fs::write(dir.path().join("binary.js"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let result = create_analyzer().analyze(dir.path()).unwrap();
    assert_eq!(result.stats.files, 3);
    assert_eq!(result.stats.errors, 1);
    let broken = result.files.iter().find(|f| f.path == "binary.js").unwrap();
    assert!(broken.error.is_some());
    assert!(broken.ast.is_none());
    assert!(result.graph.node("good.py::func::good").is_some());
}

#[test]
fn test_analyze_git_repository() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    write(dir.path(), "app.py", "def run():\n    pass\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "Add app"]);
    write(dir.path(), "app.py", "def run():\n    return 1\n");
    write(dir.path(), "lib.py", "import app\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "Update app"]);

    let result = create_analyzer().analyze(dir.path()).unwrap();
    let commits = &result.history.commits;
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "Update app");
    assert_eq!(commits[0].author, "Test");
    assert_eq!(commits[0].files.len(), 2);

    assert_eq!(result.history.hotspots[0].file, "app.py");
    assert_eq!(result.history.hotspots[0].touches, 2);

    let graph = &result.graph;
    assert_eq!(graph.nodes_of(NodeKind::Commit).count(), 2);
    let changed: Vec<&str> = graph
        .edges_of(EdgeKind::Changed)
        .map(|e| e.target.as_str())
        .collect();
    assert_eq!(changed.iter().filter(|t| **t == "app.py").count(), 2);
}

#[test]
fn test_history_disabled() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    write(dir.path(), "app.py", "x = 1\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "init"]);

    let mut config = Config::default();
    config.history.enabled = false;
    let result = Analyzer::new(config).unwrap().analyze(dir.path()).unwrap();
    assert!(result.history.commits.is_empty());
}

// ============================================================================
// Output Tests
// ============================================================================

#[test]
fn test_render_pipeline_output() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/app.py", "def main():\n    run()\n");

    let result = create_analyzer().analyze(dir.path()).unwrap();
    let rendered = DiagramGenerator::new().render_graph(&result.graph);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            "graph TD",
            "    src_app_py[src/app.py]",
            "    src_app_py_func_main[\"main()\"]",
            "    src_app_py--defines-->src_app_py_func_main",
            "    src_app_py--calls-->run",
        ]
    );
}

#[test]
fn test_graph_json_round_trip() {
    let dir = mixed_project();
    let result = create_analyzer().analyze(dir.path()).unwrap();
    let json = serde_json::to_string(&result.graph).unwrap();
    let back: docgraph::KnowledgeGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result.graph);
}

#[test]
fn test_build_graph_from_normalized_records() {
    let dir = mixed_project();
    let analyzer = create_analyzer();
    let files = analyzer.parse_repo(dir.path()).unwrap();
    let graph = build_graph(&files, &[]);
    assert_eq!(graph.stats().files, 4);
}

#[test]
fn test_config_file_drives_analysis() {
    let dir = mixed_project();
    let config_path = dir.path().join("docgraph.toml");
    fs::write(
        &config_path,
        "[analysis]\nexclude_dirs = [\"web\"]\n\n[output]\nformat = \"json\"\n",
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert_eq!(config.output.format, OutputFormat::Json);
    let result = Analyzer::new(config).unwrap().analyze(dir.path()).unwrap();

    let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["pkg/solution.py", "node_modules/dep/index.js"]);
}
