use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lineage::core::default_root;
use lineage::formatters::{DotFormatter, JsonCompactFormatter, RecordsFormatter, TextFormatter};
use lineage::{BuildOptions, DependencyTree, DependencyTreeBuilder, Direction, EntityIndex, EntityKind};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "lineage",
    version,
    about = "Upstream and downstream dependency trees for Python entities"
)]
struct Cli {
    /// Python file that defines the target entity
    #[arg(value_name = "FILE")]
    file_path: PathBuf,

    /// Name of the target function, class or module
    #[arg(value_name = "NAME")]
    entity_name: String,

    /// Kind of the target entity: function, class or module
    #[arg(value_name = "KIND")]
    entity_type: EntityKind,

    /// Deepest level to expand (unlimited when omitted)
    #[arg(short = 'd', long, value_name = "N")]
    max_depth: Option<usize>,

    /// Directory to search for dependencies (defaults to the file's directory)
    #[arg(short = 'r', long, value_name = "DIR")]
    codebase_root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,

    /// Write the rendering to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only show what the target depends on
    #[arg(long, conflicts_with = "downstream_only")]
    upstream_only: bool,

    /// Only show what depends on the target
    #[arg(long)]
    downstream_only: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Tree,
    Graph,
    List,
    Paths,
    Depths,
    Json,
    Records,
    Csv,
    Dot,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();

    let mut options = BuildOptions::new();
    if let Some(max_depth) = cli.max_depth {
        options = options.with_max_depth(max_depth);
    }
    if cli.upstream_only {
        options = options.with_direction(Direction::Upstream);
    } else if cli.downstream_only {
        options = options.with_direction(Direction::Downstream);
    }

    let root = match &cli.codebase_root {
        Some(root) => root.clone(),
        None => default_root(&cli.file_path),
    };

    let index = EntityIndex::for_python(&root)?;
    let tree = DependencyTreeBuilder::new(&index).build(
        &cli.file_path,
        &cli.entity_name,
        cli.entity_type,
        &options,
    )?;

    let rendered = render(&tree, cli.format)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Output written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    for warning in tree.skipped_files() {
        eprintln!("warning: skipped {warning}");
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

fn render(tree: &DependencyTree, format: OutputFormat) -> Result<String> {
    let text = TextFormatter::new();
    Ok(match format {
        OutputFormat::Tree => tree.pretty_string(),
        OutputFormat::Graph => text.render_graph(tree),
        OutputFormat::List => text.render_list(tree),
        OutputFormat::Paths => tree.path_report(),
        OutputFormat::Depths => text.render_depths(tree),
        OutputFormat::Json => {
            let mut json = JsonCompactFormatter::new().format_tree(tree)?;
            json.push('\n');
            json
        }
        OutputFormat::Records => {
            let mut json = RecordsFormatter::new().to_json(tree)?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => RecordsFormatter::new().to_csv(tree),
        OutputFormat::Dot => DotFormatter::new().format_tree(tree),
    })
}
