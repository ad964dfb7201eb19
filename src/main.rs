mod config;
mod filter;
mod walker;

use clap::{CommandFactory, Parser};
use config::{FiltersConfig, Overrides};
use filter::FilterOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Scan a whisper metrics tree and print deduplicated matcher filters for its layout
#[derive(Parser, Debug)]
#[command(name = "whisper-filters", version, about, long_about = None)]
pub struct Cli {
    /// Top of metrics tree
    #[arg(long, value_name = "PATH")]
    path: Option<PathBuf>,

    /// Don't include the leaf metric name in the filter
    #[arg(long, overrides_with = "no_skip_leaves")]
    skip_leaves: bool,

    /// Include the leaf metric name in the filter (default)
    #[arg(long, overrides_with = "skip_leaves")]
    no_skip_leaves: bool,

    /// Sort metric paths before deduplicating, for reproducible output
    #[arg(long, overrides_with = "no_sort")]
    sort: bool,

    /// Keep filesystem discovery order (default)
    #[arg(long, overrides_with = "sort")]
    no_sort: bool,

    /// Read metric paths from this file instead of walking PATH
    #[arg(long, value_name = "FILE")]
    file_list: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging (skipped files, dedup counts)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            skip_leaves: flag_pair(self.skip_leaves, self.no_skip_leaves),
            sort: flag_pair(self.sort, self.no_sort),
        }
    }
}

/// Collapse a `--x` / `--no-x` pair into a tri-state.
fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    ExitCode::from(exit_status(&cli))
}

/// Print help when `--path` is missing, otherwise run. Returns the process status.
fn exit_status(cli: &Cli) -> u8 {
    let Some(root) = cli.path.clone() else {
        let _ = Cli::command().print_help();
        return 1;
    };

    match run(cli, root) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "whisper-filters failed");
            eprintln!("Error: {e}");
            1
        }
    }
}

fn run(cli: &Cli, root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = FiltersConfig::load(cli.config.as_deref())?;
    let settings = config.resolve(&cli.overrides());
    tracing::debug!(?settings, "resolved settings");

    let mut walk = match &cli.file_list {
        Some(list) => walker::read_file_list(list, &root, &settings.suffix)?,
        None => walker::walk_metrics(&root, &settings.suffix)?,
    };
    if settings.sort {
        walk.paths.sort();
    }

    let options = FilterOptions {
        skip_leaves: settings.skip_leaves,
        keep_empty: settings.keep_empty,
    };
    let filters = filter::accumulate_filters(&walk.paths, options);
    tracing::info!(
        metrics = walk.paths.len(),
        filters = filters.len(),
        skip_leaves = settings.skip_leaves,
        "generated filters"
    );

    let stdout = std::io::stdout();
    filter::write_filters(BufWriter::new(stdout.lock()), &filters)?;
    Ok(())
}
