//! CLI module for docgraph

mod args;

pub use args::{Args, Command};

use crate::analysis::{AnalysisResult, Analyzer};
use crate::config::{CliOverrides, Config, OutputFormat, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::logging::init_tracing;
use crate::output::DiagramGenerator;
use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

pub fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Graph {
            path,
            output,
            format,
            config,
            direction,
            no_history,
            no_tree_sitter,
            verbose,
        } => {
            init_tracing(verbose);

            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(CliOverrides {
                format: format.as_deref().map(OutputFormat::parse).transpose()?,
                direction,
                no_history,
                no_tree_sitter,
            });

            let analyzer = Analyzer::new(cfg)?.with_verbose(verbose);
            let analysis = analyzer.analyze(&path)?;
            let rendered = render(&analysis, analyzer.config())?;

            match output {
                Some(out) => {
                    write_output(&out, &rendered)?;
                    info!("graph written to {}", out.display());
                    if verbose {
                        println!("Graph written to: {}", out.display());
                    }
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }

        Command::Parse {
            path,
            no_tree_sitter,
        } => {
            init_tracing(false);

            let mut cfg = load_config(None)?;
            cfg.merge_cli(CliOverrides {
                no_tree_sitter,
                ..CliOverrides::default()
            });

            let analyzer = Analyzer::new(cfg)?;
            let files = analyzer.parse_repo(&path)?;
            println!("{}", serde_json::to_string_pretty(&files)?);
            Ok(())
        }

        Command::Stats { path } => {
            init_tracing(false);

            let analyzer = Analyzer::new(load_config(None)?)?;
            let analysis = analyzer.analyze(&path)?;
            print!("{}", stats_report(&analyzer, &analysis));
            Ok(())
        }

        Command::Version => {
            println!("docgraph {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// An explicit config file must exist; the default one is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

fn render(analysis: &AnalysisResult, config: &Config) -> Result<String> {
    match config.output.format {
        OutputFormat::Mermaid => {
            let generator = DiagramGenerator::new().with_direction(&config.diagrams.direction);
            Ok(generator.render_graph(&analysis.graph))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&analysis.graph)?),
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn stats_report(analyzer: &Analyzer, analysis: &AnalysisResult) -> String {
    let stats = &analysis.stats;
    let graph = analysis.graph.stats();
    let mut out = String::new();

    let _ = writeln!(out, "Files:     {}", stats.files);
    let _ = writeln!(out, "Functions: {}", stats.functions);
    let _ = writeln!(out, "Classes:   {}", stats.classes);
    let _ = writeln!(out, "Imports:   {}", stats.imports);
    let _ = writeln!(out, "Calls:     {}", stats.calls);
    let _ = writeln!(out, "Errors:    {}", stats.errors);
    let _ = writeln!(out, "Graph:     {} nodes, {} edges", graph.nodes(), graph.edges());

    let _ = writeln!(out, "\nBackends:");
    for (language, backend) in analyzer.registry().backends() {
        let _ = writeln!(out, "  {}: {}", language, backend.kind());
    }

    if !analysis.history.hotspots.is_empty() {
        let _ = writeln!(out, "\nHotspots:");
        for hotspot in &analysis.history.hotspots {
            let _ = writeln!(out, "  {} ({} commits)", hotspot.file, hotspot.touches);
        }
    }

    let errors: Vec<(&str, &str)> = analysis.parse_errors().collect();
    if !errors.is_empty() {
        let _ = writeln!(out, "\nParse errors ({}):", errors.len());
        for (path, err) in errors.iter().take(5) {
            let _ = writeln!(out, "  {}: {}", path, err);
        }
        if errors.len() > 5 {
            let _ = writeln!(out, "  ... and {} more", errors.len() - 5);
        }
    }

    let gitignore = if analysis.gitignore.is_some() { "yes" } else { "no" };
    let _ = writeln!(out, "\n.gitignore: {}", gitignore);
    out
}
