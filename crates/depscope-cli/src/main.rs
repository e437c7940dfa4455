//! CLI binary for depscope: parse package manifests, build the dependency
//! graph, and run traversal, cycle, and rendering analyses over it.

mod fetch;
mod save;

use clap::{Parser, Subcommand};
use depscope_core::config::{ConfigError, OutputMode, RunConfig};
use depscope_core::graph::{DepGraph, NameCase};
use depscope_core::manifest::{self, Manifest, ManifestFormat};
use depscope_nav::{cycles, export, traverse, tree};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "depscope", about = "Package dependency graph analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Config-driven run: parse, analyze, print, and save the result
    Run {
        /// Path to the TOML run configuration
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Render the ASCII dependency tree from a start package
    Tree {
        /// Manifest file describing the dependency graph
        #[arg(short, long)]
        graph: PathBuf,

        /// Package to start from
        #[arg(short, long)]
        start: String,

        /// Manifest format: line-csv, line-ws, json, apkindex (auto-detected if omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Upper-case every package name
        #[arg(long)]
        uppercase: bool,
    },

    /// Print the breadth-first dependency order from a start package
    Bfs {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long)]
        start: String,

        /// Walk reverse dependencies (who depends on the start package)
        #[arg(short, long)]
        reverse: bool,

        #[arg(short, long)]
        format: Option<String>,

        #[arg(long)]
        uppercase: bool,
    },

    /// Check the whole graph for cyclic dependencies
    Cycles {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long)]
        format: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        #[arg(long)]
        uppercase: bool,
    },

    /// Export the graph as an edge list or DOT digraph
    Export {
        #[arg(short, long)]
        graph: PathBuf,

        /// Swap edge direction at emission (dependency -> dependent)
        #[arg(short, long)]
        reverse: bool,

        /// Output flavor: edges, dot
        #[arg(short, long, default_value = "dot")]
        output: String,

        #[arg(short, long)]
        format: Option<String>,

        #[arg(long)]
        uppercase: bool,
    },
}

/// Failures mapped onto the CLI's exit-code contract.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read repository")]
    Repository(#[source] anyhow::Error),

    #[error("failed to build output")]
    Analysis(#[source] anyhow::Error),

    #[error("failed to save result")]
    Save(#[source] anyhow::Error),
}

impl CliError {
    /// Each failure class gets its own non-zero exit code.
    fn exit_code(&self) -> u8 {
        match self {
            Self::Config(ConfigError::EmptyField(_)) => 3,
            Self::Config(_) => 2,
            Self::Repository(_) => 4,
            Self::Analysis(_) => 5,
            Self::Save(_) => 6,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn report(err: &CliError) {
    eprintln!("ERROR: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run { config } => cmd_run(&config),
        Commands::Tree {
            graph,
            start,
            format,
            uppercase,
        } => {
            let (graph, case) = load_graph(&graph, format.as_deref(), uppercase)?;
            print!("{}", tree::render(&graph, &case.apply(start.trim())));
            Ok(())
        }
        Commands::Bfs {
            graph,
            start,
            reverse,
            format,
            uppercase,
        } => {
            let (graph, case) = load_graph(&graph, format.as_deref(), uppercase)?;
            let start = case.apply(start.trim());
            let order = if reverse {
                traverse::bfs_reverse(&graph, &start)
            } else {
                traverse::bfs(&graph, &start)
            };
            println!("{}", order.join(" -> "));
            Ok(())
        }
        Commands::Cycles {
            graph,
            format,
            json,
            uppercase,
        } => {
            let (graph, _) = load_graph(&graph, format.as_deref(), uppercase)?;
            let report = cycles::detect(&graph);
            if json {
                let rendered = serde_json::to_string_pretty(&report)
                    .map_err(|e| CliError::Analysis(e.into()))?;
                println!("{rendered}");
            } else {
                println!("{}", report.summary);
            }
            Ok(())
        }
        Commands::Export {
            graph,
            reverse,
            output,
            format,
            uppercase,
        } => {
            let (graph, _) = load_graph(&graph, format.as_deref(), uppercase)?;
            let rendered = match output.trim().to_lowercase().as_str() {
                "dot" => export::export_dot(&graph, reverse),
                "edges" => export::format_edges(&graph, reverse),
                other => {
                    return Err(CliError::Analysis(anyhow::anyhow!(
                        "unknown export output `{other}` (expected dot or edges)"
                    )));
                }
            };
            print!("{rendered}");
            Ok(())
        }
    }
}

/// Parse a manifest file for the ad-hoc subcommands.
fn load_graph(
    path: &Path,
    format: Option<&str>,
    uppercase: bool,
) -> Result<(DepGraph, NameCase), CliError> {
    let format = parse_format(format)?;
    let case = if uppercase {
        NameCase::Upper
    } else {
        NameCase::Preserve
    };
    let manifest = manifest::parse_path(path, format, case)
        .map_err(|e| CliError::Repository(anyhow::Error::new(e)))?;
    Ok((manifest.graph, case))
}

fn parse_format(arg: Option<&str>) -> Result<Option<ManifestFormat>, CliError> {
    arg.map(|s| {
        s.parse::<ManifestFormat>()
            .map_err(|e| CliError::Repository(anyhow::anyhow!(e)))
    })
    .transpose()
}

fn cmd_run(config_path: &Path) -> Result<(), CliError> {
    let config = RunConfig::load(config_path)?;
    tracing::info!(
        package = %config.package,
        repository = %config.repository,
        output = config.output().as_str(),
        "starting run"
    );

    let manifest = load_repository(&config)?;
    let start = config.start_package();
    if !manifest.graph.contains(&start) {
        tracing::warn!("package `{start}` not found in repository; it will be shown as a leaf");
    }
    if let Some(version) = manifest.versions.get(&start) {
        println!("{start} {version}");
    }

    let output = build_output(&manifest.graph, &start, config.output(), config.reverse);
    print!("{output}");

    let target_dir = save::resolve_target_dir(&config.repository);
    let saved = save::save_result(&output, &target_dir, &start).map_err(CliError::Save)?;
    if saved.committed {
        tracing::info!(path = %saved.path.display(), "result saved and committed");
    } else {
        tracing::info!(path = %saved.path.display(), "result saved");
    }
    Ok(())
}

/// Resolve the configured repository: a URL is fetched as a binary index,
/// anything else is read as a local manifest file.
fn load_repository(config: &RunConfig) -> Result<Manifest, CliError> {
    let case = config.name_case();
    let repo = config.repository.trim();
    if repo.starts_with("http://") || repo.starts_with("https://") {
        let bytes = fetch::fetch_index(repo).map_err(CliError::Repository)?;
        manifest::parse_binary_index(&bytes, case)
            .map_err(|e| CliError::Repository(anyhow::Error::new(e)))
    } else {
        manifest::parse_path(Path::new(repo), config.manifest_format(), case)
            .map_err(|e| CliError::Repository(anyhow::Error::new(e)))
    }
}

fn build_output(graph: &DepGraph, start: &str, mode: OutputMode, reverse: bool) -> String {
    match mode {
        OutputMode::Tree => {
            if reverse {
                tree::render(&graph.reversed(), start)
            } else {
                tree::render(graph, start)
            }
        }
        OutputMode::Bfs => {
            let order = if reverse {
                traverse::bfs_reverse(graph, start)
            } else {
                traverse::bfs(graph, start)
            };
            let mut line = order.join(" -> ");
            line.push('\n');
            line
        }
        OutputMode::Edges => export::format_edges(graph, reverse),
        OutputMode::Dot => export::export_dot(graph, reverse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_failure_class() {
        assert_eq!(
            CliError::Config(ConfigError::EmptyField("package")).exit_code(),
            3
        );
        assert_eq!(
            CliError::Config(ConfigError::NotFound(PathBuf::from("x"))).exit_code(),
            2
        );
        assert_eq!(
            CliError::Repository(anyhow::anyhow!("boom")).exit_code(),
            4
        );
        assert_eq!(CliError::Analysis(anyhow::anyhow!("boom")).exit_code(), 5);
        assert_eq!(CliError::Save(anyhow::anyhow!("boom")).exit_code(), 6);
    }

    #[test]
    fn build_output_modes() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "b");

        assert_eq!(build_output(&graph, "a", OutputMode::Bfs, false), "a -> b\n");
        assert_eq!(build_output(&graph, "b", OutputMode::Bfs, true), "b -> a\n");
        assert!(build_output(&graph, "a", OutputMode::Tree, false).contains("└─ b"));
        assert_eq!(build_output(&graph, "a", OutputMode::Edges, false), "a -> b\n");
        assert!(build_output(&graph, "a", OutputMode::Dot, true).contains("\"b\" -> \"a\";"));
    }

    #[test]
    fn reversed_tree_walks_dependents() {
        let mut graph = DepGraph::new();
        graph.add_edge("app", "lib");
        let output = build_output(&graph, "lib", OutputMode::Tree, true);
        assert_eq!(output, "lib\n└─ app\n");
    }
}
