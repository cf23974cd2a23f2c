// Analysis pipeline: walk, normalize, read history, build the graph

pub mod graph;
pub mod normalize;

pub use graph::*;
pub use normalize::{normalize_paths, relative_path};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::{describe_repo, RepoHistory};
use crate::parser::{ParsedFile, ParserRegistry};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Result of analyzing a repository
#[derive(Debug)]
pub struct AnalysisResult {
    /// Parsed files with repository-relative paths
    pub files: Vec<ParsedFile>,
    pub history: RepoHistory,
    pub graph: KnowledgeGraph,
    pub stats: ProjectStats,
    /// Raw `.gitignore` text, never applied to the walk
    pub gitignore: Option<String>,
}

impl AnalysisResult {
    /// Files whose parse failed, with the recorded error
    pub fn parse_errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .filter_map(|f| f.error.as_deref().map(|e| (f.path.as_str(), e)))
    }
}

/// Totals across all parsed files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub files: usize,
    pub functions: usize,
    pub classes: usize,
    pub imports: usize,
    pub calls: usize,
    pub errors: usize,
}

impl ProjectStats {
    pub fn collect(files: &[ParsedFile]) -> Self {
        files.iter().fold(Self::default(), |mut stats, f| {
            stats.files += 1;
            stats.functions += f.functions.len();
            stats.classes += f.classes.len();
            stats.imports += f.imports.len();
            stats.calls += f.calls.len();
            stats.errors += usize::from(f.has_error());
            stats
        })
    }
}

/// Main analyzer that orchestrates the analysis pipeline
pub struct Analyzer {
    config: Config,
    registry: ParserRegistry,
    verbose: bool,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = ParserRegistry::with_defaults(config.parsing.tree_sitter);

        Ok(Self {
            config,
            registry,
            verbose: false,
        })
    }

    /// Create analyzer with verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Parse every supported file under `root`, paths left absolute
    pub fn parse_code(&self, root: &Path) -> Result<Vec<ParsedFile>> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        Ok(self.registry.parse_directory(root, &self.config.walk_options()))
    }

    /// Parse every supported file under `root` with repository-relative paths
    pub fn parse_repo(&self, root: &Path) -> Result<Vec<ParsedFile>> {
        let mut files = self.parse_code(root)?;
        normalize_paths(&mut files, base_dir(root));
        Ok(files)
    }

    /// Run the full pipeline on a repository
    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }

        let progress = self.spinner();
        let step = |msg: &str| {
            info!("{}", msg);
            if let Some(pb) = &progress {
                pb.set_message(msg.to_string());
            }
        };

        step("parsing sources");
        let files = self.parse_repo(root)?;
        for (path, error) in files.iter().filter_map(|f| f.error.as_deref().map(|e| (&f.path, e))) {
            warn!("{}: {}", path, error);
        }

        let history = if self.config.history.enabled {
            step("reading git history");
            describe_repo(root, &self.config.history_options())
        } else {
            RepoHistory::default()
        };

        step("building graph");
        let graph = build_graph(&files, &history.commits);
        let stats = ProjectStats::collect(&files);
        let gitignore = load_gitignore(root);

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        info!(
            files = stats.files,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            files,
            history,
            graph,
            stats,
            gitignore,
        })
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Raw `.gitignore` text at the repository root, if present and readable
pub fn load_gitignore(root: &Path) -> Option<String> {
    std::fs::read_to_string(root.join(".gitignore")).ok()
}

/// Directory that parsed paths are made relative to
fn base_dir(root: &Path) -> &Path {
    if !root.is_file() {
        return root;
    }
    match root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
