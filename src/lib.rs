//! docgraph - Knowledge graphs of source repositories
//!
//! Parses Python, JavaScript and TypeScript sources into structural records,
//! joins them with git history into a typed node/edge graph, and renders the
//! graph as a Mermaid diagram.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{build_graph, AnalysisResult, Analyzer, KnowledgeGraph};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{describe_repo, CommitRecord, RepoHistory};
pub use output::{sanitize_id, DiagramGenerator};
pub use parser::{ParsedFile, ParserRegistry, SourceParser};
