//! ton-harvest main entry point
//!
//! Without arguments this crawls the built-in TON seed list into `TON_Library/`
//! and prints a summary of the run.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use ton_harvest::config::{load_config_with_hash, Config};
use ton_harvest::crawler::run_crawl;
use ton_harvest::output::print_report;
use tracing_subscriber::EnvFilter;

/// ton-harvest: a recursive document harvester
///
/// Crawls each seed URL, saves page text, downloads linked PDF/DOC/DOCX files
/// and follows same-host links down to a fixed depth.
#[derive(Parser, Debug)]
#[command(name = "ton-harvest")]
#[command(version)]
#[command(about = "A recursive document harvester", long_about = None)]
struct Cli {
    /// Optional TOML configuration file overriding the built-in defaults
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let report = run_crawl(&config)
        .await
        .context("crawl could not start")?;

    print_report(&report);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ton_harvest=info,warn"),
            1 => EnvFilter::new("ton_harvest=debug,info"),
            2 => EnvFilter::new("ton_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== ton-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);

    println!("\nFetch:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }
}
