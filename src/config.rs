use crate::error::{Error, Result};
use crate::history::HistoryOptions;
use crate::parser::{walk::default_exclude_dirs, WalkOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "docgraph.toml";

/// Accepted Mermaid layout directions
pub const DIRECTIONS: &[&str] = &["TD", "TB", "BT", "LR", "RL"];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub parsing: ParsingConfig,
    pub history: HistoryConfig,
    pub diagrams: DiagramConfig,
    pub output: OutputConfig,
}

/// Directory walk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory names skipped anywhere below the root
    pub exclude_dirs: Vec<String>,
    pub sort_files: bool,
    pub parallel: bool,
    pub follow_links: bool,
}

/// Parser backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// false forces the heuristic fallback for every language
    pub tree_sitter: bool,
}

/// Git history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub commit_limit: usize,
    pub hotspot_limit: usize,
}

/// Diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub direction: String,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mermaid,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::config_validation(format!("unknown output format: {}", other))),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            sort_files: true,
            parallel: true,
            follow_links: false,
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self { tree_sitter: true }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            commit_limit: 10,
            hotspot_limit: 10,
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            direction: "TD".to_string(),
        }
    }
}

/// Command-line overrides; `None`/`false` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub direction: Option<String>,
    pub no_history: bool,
    pub no_tree_sitter: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.diagrams.direction.make_ascii_uppercase();
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults when the file does not exist.
    ///
    /// A file that exists but is malformed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, overrides: CliOverrides) {
        if let Some(format) = overrides.format {
            self.output.format = format;
        }

        if let Some(direction) = overrides.direction {
            self.diagrams.direction = direction.to_ascii_uppercase();
        }

        if overrides.no_history {
            self.history.enabled = false;
        }

        if overrides.no_tree_sitter {
            self.parsing.tree_sitter = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history.commit_limit == 0 {
            return Err(Error::config_validation("commit_limit must be at least 1"));
        }

        if self.history.commit_limit > 1000 {
            return Err(Error::config_validation("commit_limit cannot exceed 1000"));
        }

        if self.history.hotspot_limit == 0 {
            return Err(Error::config_validation("hotspot_limit must be at least 1"));
        }

        if !DIRECTIONS.contains(&self.diagrams.direction.as_str()) {
            return Err(Error::config_validation(format!(
                "diagram direction must be one of {}, got {}",
                DIRECTIONS.join(", "),
                self.diagrams.direction
            )));
        }

        if self.analysis.exclude_dirs.iter().any(|d| d.is_empty() || d.contains('/')) {
            return Err(Error::config_validation(
                "exclude_dirs entries must be plain directory names",
            ));
        }

        Ok(())
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            exclude_dirs: self.analysis.exclude_dirs.clone(),
            sort_files: self.analysis.sort_files,
            follow_links: self.analysis.follow_links,
            parallel: self.analysis.parallel,
        }
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            commit_limit: self.history.commit_limit,
            hotspot_limit: self.history.hotspot_limit,
        }
    }
}
