// Diagram generation for docgraph
//
// Renders the knowledge graph and per-file workflows as Mermaid text.

use crate::analysis::{class_id, function_id, KnowledgeGraph};
use crate::parser::ParsedFile;
use serde::Serialize;

/// Characters that force a node label to be quoted
const LABEL_SPECIAL: &[char] = &['(', ')', '[', ']', '{', '}'];

/// Mermaid diagram for one file's top-level definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWorkflow {
    pub file: String,
    pub mermaid: String,
}

/// Diagram generator for creating Mermaid diagrams
#[derive(Debug, Clone)]
pub struct DiagramGenerator {
    /// Layout direction (TD, TB, BT, LR, RL)
    direction: String,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new() -> Self {
        Self {
            direction: "TD".to_string(),
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    /// Render every node and edge, in graph order.
    ///
    /// Edge endpoints are sanitized the same way as node ids, so an edge to a
    /// raw import or call target becomes an implicit node in the diagram.
    pub fn render_graph(&self, graph: &KnowledgeGraph) -> String {
        let mut lines = Vec::with_capacity(1 + graph.nodes.len() + graph.edges.len());
        lines.push(format!("graph {}", self.direction));

        for node in &graph.nodes {
            lines.push(format!(
                "    {}[{}]",
                sanitize_id(Some(&node.id)),
                node_label(&node.label)
            ));
        }

        for edge in &graph.edges {
            lines.push(format!(
                "    {}--{}-->{}",
                sanitize_id(Some(&edge.source)),
                edge.kind,
                sanitize_id(Some(&edge.target))
            ));
        }

        lines.join("\n")
    }

    /// Flowchart linking a file to each of its top-level functions and classes
    pub fn render_file_workflow(&self, file: &ParsedFile) -> String {
        let file_id = sanitize_id(Some(&file.path));
        let mut lines = vec![
            format!("flowchart {}", self.direction),
            format!("    {}[{}]", file_id, quoted(&file.path)),
        ];

        for func in &file.functions {
            let id = sanitize_id(Some(&function_id(&file.path, &func.name)));
            lines.push(format!("    {}[{}]", id, quoted(&format!("{}()", func.name))));
            lines.push(format!("    {} --> {}", file_id, id));
        }

        for class in &file.classes {
            let id = sanitize_id(Some(&class_id(&file.path, &class.name)));
            lines.push(format!("    {}[{}]", id, quoted(&format!("class {}", class.name))));
            lines.push(format!("    {} --> {}", file_id, id));
        }

        lines.join("\n")
    }

    /// One workflow diagram per file, in input order
    pub fn render_file_workflows(&self, files: &[ParsedFile]) -> Vec<FileWorkflow> {
        files
            .iter()
            .map(|file| FileWorkflow {
                file: file.path.clone(),
                mermaid: self.render_file_workflow(file),
            })
            .collect()
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Map any text to a Mermaid-safe node id.
///
/// Total and deterministic, but not injective: `a/b` and `a-b` collide.
pub fn sanitize_id(text: Option<&str>) -> String {
    let Some(text) = text else {
        return "unknown".to_string();
    };

    let replaced = text
        .replace("::", "_")
        .replace(['/', '\\', ' ', '-'], "_");
    let mut id: String = replaced
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if id.is_empty() {
        return "unknown".to_string();
    }
    if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        id.insert_str(0, "n_");
    }
    id
}

/// Node label on a single line, quoted when Mermaid would misread it
fn node_label(label: &str) -> String {
    let label = single_line(label);
    if label.contains(LABEL_SPECIAL) || label.contains('"') {
        quoted(&label)
    } else {
        label
    }
}

fn quoted(label: &str) -> String {
    format!("\"{}\"", single_line(label).replace('"', "#quot;"))
}

/// Join the non-blank lines of multi-line text with single spaces
fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
