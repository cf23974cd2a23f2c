//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build a knowledge graph of a repository and render it as Mermaid
#[derive(Parser, Debug)]
#[command(name = "docgraph")]
#[command(about = "Build a knowledge graph of a repository and render it as Mermaid")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the knowledge graph and print or write it
    Graph {
        /// Path to the repository to analyze
        path: PathBuf,

        /// Write the output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (mermaid, json)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Diagram direction (TD, TB, BT, LR, RL)
        #[arg(long)]
        direction: Option<String>,

        /// Skip reading git history
        #[arg(long)]
        no_history: bool,

        /// Force the heuristic parsers
        #[arg(long)]
        no_tree_sitter: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the parsed file records as JSON
    Parse {
        /// File or directory to parse
        path: PathBuf,

        /// Force the heuristic parsers
        #[arg(long)]
        no_tree_sitter: bool,
    },

    /// Print summary statistics for a repository
    Stats {
        /// Path to the repository
        path: PathBuf,
    },

    /// Show version information
    Version,
}
