// Knowledge graph joining parsed files with commit history

use crate::history::CommitRecord;
use crate::parser::{Language, ParsedFile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of node in the knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Function,
    Class,
    Commit,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::Commit => "commit",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of edge in the knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// File defines a top-level function or class
    Defines,
    /// File imports a raw import statement
    Imports,
    /// File calls a raw callee text
    Calls,
    /// Commit changed a file path
    Changed,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Defines => "defines",
            EdgeKind::Imports => "imports",
            EdgeKind::Calls => "calls",
            EdgeKind::Changed => "changed",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Set on file nodes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            language: None,
        }
    }

    pub fn file(file: &ParsedFile) -> Self {
        Self {
            language: Some(file.language),
            ..Self::new(&file.path, &file.path, NodeKind::File)
        }
    }
}

/// A directed edge. The target may name something that is not a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

/// Nodes and edges in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    /// Get all nodes of one kind
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Get all edges of one kind
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// First node with this id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges whose target is not a node id (imports, calls and
    /// changed paths routinely are)
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.target.as_str()))
            .collect()
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            files: self.nodes_of(NodeKind::File).count(),
            functions: self.nodes_of(NodeKind::Function).count(),
            classes: self.nodes_of(NodeKind::Class).count(),
            commits: self.nodes_of(NodeKind::Commit).count(),
            defines: self.edges_of(EdgeKind::Defines).count(),
            imports: self.edges_of(EdgeKind::Imports).count(),
            calls: self.edges_of(EdgeKind::Calls).count(),
            changed: self.edges_of(EdgeKind::Changed).count(),
        }
    }
}

/// Statistics about the knowledge graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub functions: usize,
    pub classes: usize,
    pub commits: usize,
    pub defines: usize,
    pub imports: usize,
    pub calls: usize,
    pub changed: usize,
}

impl GraphStats {
    pub fn nodes(&self) -> usize {
        self.files + self.functions + self.classes + self.commits
    }

    pub fn edges(&self) -> usize {
        self.defines + self.imports + self.calls + self.changed
    }
}

pub fn function_id(file: &str, name: &str) -> String {
    format!("{}::func::{}", file, name)
}

pub fn class_id(file: &str, name: &str) -> String {
    format!("{}::class::{}", file, name)
}

/// Build the graph from parsed files and commits.
///
/// Nothing is deduplicated or resolved: identical imports in two files give
/// two edges to the same raw text, and call targets stay as written.
pub fn build_graph(files: &[ParsedFile], commits: &[CommitRecord]) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();

    for file in files {
        let path = file.path.as_str();
        graph.add_node(GraphNode::file(file));

        for func in &file.functions {
            let id = function_id(path, &func.name);
            graph.add_node(GraphNode::new(&id, format!("{}()", func.name), NodeKind::Function));
            graph.add_edge(GraphEdge::new(path, id, EdgeKind::Defines));
        }

        for class in &file.classes {
            let id = class_id(path, &class.name);
            graph.add_node(GraphNode::new(&id, format!("class {}", class.name), NodeKind::Class));
            graph.add_edge(GraphEdge::new(path, id, EdgeKind::Defines));
        }

        for import in &file.imports {
            graph.add_edge(GraphEdge::new(path, import, EdgeKind::Imports));
        }

        for target in file.calls.iter().filter_map(|c| c.target.as_deref()) {
            if !target.is_empty() {
                graph.add_edge(GraphEdge::new(path, target, EdgeKind::Calls));
            }
        }
    }

    for commit in commits {
        let label = if commit.message.is_empty() {
            "commit"
        } else {
            commit.message.as_str()
        };
        graph.add_node(GraphNode::new(&commit.hash, label, NodeKind::Commit));
        for stat in &commit.files {
            graph.add_edge(GraphEdge::new(&commit.hash, &stat.path, EdgeKind::Changed));
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::FileStat;
    use crate::parser::{Call, Class, Function, Span};

    fn sample_file(path: &str) -> ParsedFile {
        let mut file = ParsedFile::new(path, Language::Python);
        file.imports.push("import os".to_string());
        file.functions.push(Function::new("main"));
        file.functions.push(Function::new("helper"));
        let mut class = Class::new("Widget");
        class.methods.push(Function::new("render"));
        file.classes.push(class);
        file.calls.push(Call::new(Some("helper".to_string()), Span::new((1, 4), (1, 12))));
        file.calls.push(Call::new(None, Span::new((2, 4), (2, 9))));
        file
    }

    fn commit(hash: &str, message: &str, paths: &[&str]) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            author: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            date: "2024-03-01T10:00:00+00:00".to_string(),
            message: message.to_string(),
            files: paths
                .iter()
                .map(|p| FileStat {
                    path: p.to_string(),
                    insertions: 1,
                    deletions: 0,
                    lines: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_input() {
        let graph = build_graph(&[], &[]);
        assert!(graph.is_empty());
        assert_eq!(graph.stats(), GraphStats::default());
    }

    #[test]
    fn test_one_node_and_defines_edge_per_definition() {
        let graph = build_graph(&[sample_file("app.py")], &[]);
        let stats = graph.stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.functions, 2);
        assert_eq!(stats.classes, 1);
        assert_eq!(stats.defines, 3);

        let main = graph.node("app.py::func::main").unwrap();
        assert_eq!(main.label, "main()");
        assert_eq!(main.kind, NodeKind::Function);
        let widget = graph.node("app.py::class::Widget").unwrap();
        assert_eq!(widget.label, "class Widget");

        // methods are not graph nodes
        assert!(graph.nodes.iter().all(|n| !n.id.contains("render")));
    }

    #[test]
    fn test_emission_order() {
        let graph = build_graph(&[sample_file("app.py")], &[commit("abc", "fix", &["app.py"])]);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["app.py", "app.py::func::main", "app.py::func::helper", "app.py::class::Widget", "abc"]
        );
        let kinds: Vec<EdgeKind> = graph.edges.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EdgeKind::Defines,
                EdgeKind::Defines,
                EdgeKind::Defines,
                EdgeKind::Imports,
                EdgeKind::Calls,
                EdgeKind::Changed,
            ]
        );
    }

    #[test]
    fn test_calls_skip_missing_targets() {
        let graph = build_graph(&[sample_file("app.py")], &[]);
        let calls: Vec<&GraphEdge> = graph.edges_of(EdgeKind::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source, "app.py");
        assert_eq!(calls[0].target, "helper");
    }

    #[test]
    fn test_shared_imports_are_not_merged() {
        let mut a = ParsedFile::new("a.py", Language::Python);
        a.imports.push("import os".to_string());
        let mut b = ParsedFile::new("b.py", Language::Python);
        b.imports.push("import os".to_string());

        let graph = build_graph(&[a, b], &[]);
        let imports: Vec<&GraphEdge> = graph.edges_of(EdgeKind::Imports).collect();
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().all(|e| e.target == "import os"));
        assert_eq!(imports[0].source, "a.py");
        assert_eq!(imports[1].source, "b.py");
        assert!(graph.node("import os").is_none());
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_commit_nodes_and_changed_edges() {
        let commits = vec![
            commit("abc123", "Add parser", &["src/parser.py", "README.md"]),
            commit("def456", "", &[]),
        ];
        let graph = build_graph(&[], &commits);
        assert_eq!(graph.node("abc123").unwrap().label, "Add parser");
        assert_eq!(graph.node("def456").unwrap().label, "commit");

        let changed: Vec<&str> = graph.edges_of(EdgeKind::Changed).map(|e| e.target.as_str()).collect();
        assert_eq!(changed, vec!["src/parser.py", "README.md"]);
    }

    #[test]
    fn test_dangling_edges() {
        let graph = build_graph(&[sample_file("app.py")], &[commit("abc", "m", &["app.py", "gone.py"])]);
        let dangling: Vec<&str> = graph.dangling_edges().iter().map(|e| e.target.as_str()).collect();
        assert_eq!(dangling, vec!["import os", "helper", "gone.py"]);
    }

    #[test]
    fn test_file_node_carries_language() {
        let file = ParsedFile::new("web/app.ts", Language::TypeScript);
        let graph = build_graph(&[file], &[]);
        assert_eq!(graph.nodes[0].language, Some(Language::TypeScript));
        assert_eq!(graph.nodes[0].label, "web/app.ts");
    }

    #[test]
    fn test_serialization_schema() {
        let graph = build_graph(&[sample_file("app.py")], &[commit("abc", "m", &[])]);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["type"], "file");
        assert_eq!(json["nodes"][0]["language"], "python");
        assert!(json["nodes"][1].get("language").is_none());
        assert_eq!(json["edges"][0]["type"], "defines");
        assert_eq!(json["edges"][0]["source"], "app.py");
        assert_eq!(json["nodes"][4]["type"], "commit");
    }

    #[test]
    fn test_stats_totals() {
        let graph = build_graph(&[sample_file("a.py"), sample_file("b.py")], &[]);
        let stats = graph.stats();
        assert_eq!(stats.nodes(), graph.nodes.len());
        assert_eq!(stats.edges(), graph.edges.len());
    }
}
