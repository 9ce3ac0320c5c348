//! Romstash main entry point
//!
//! This is the command-line interface for the Romstash catalog harvester.

use clap::Parser;
use romstash::config::{load_config_with_hash, validate, Config};
use romstash::crawler::{run_harvest, RunOptions};
use romstash::output::{print_summary, BarProgress, NoProgress, ProgressSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Romstash: a resumable catalog harvester
///
/// Romstash crawls a paginated ROM catalog, writes one JSON record per
/// entry and downloads thumbnails, cover images and ROM files. Every fetched
/// page and file is kept on disk, so an interrupted run picks up where it
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "romstash")]
#[command(version)]
#[command(about = "A resumable catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Collect records only, skip thumbnail, image and ROM downloads
    #[arg(long)]
    metadata_only: bool,

    /// Do not render progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let progress: Arc<dyn ProgressSink> = if cli.quiet || cli.no_progress {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let options = RunOptions {
        download_assets: !cli.metadata_only,
    };

    match run_harvest(config, progress, options).await {
        Ok(summary) => {
            tracing::info!("Harvest completed successfully");
            if !cli.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Loads the config file, or validated defaults when none was given
fn load(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("romstash=info,warn"),
            1 => EnvFilter::new("romstash=debug,info"),
            2 => EnvFilter::new("romstash=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Romstash Dry Run ===\n");

    println!("Fetcher:");
    println!("  Base URL: {}", config.fetcher.base_url);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nPipeline:");
    println!(
        "  Max concurrent requests: {}",
        config.pipeline.max_concurrent_requests
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Page cache: {}", config.output.pages_dir().display());
    println!("  Records: {}", config.output.records_path().display());

    println!("\nCatalog:");
    if config.catalog.discover_emulators {
        println!("  Emulators: discovered from the catalog index");
    }
    for emulator in &config.catalog.emulators {
        println!("  - {}", emulator);
    }
    println!("  Max pages per emulator: {}", config.catalog.max_pages);

    println!("\n✓ Configuration is valid");
}
