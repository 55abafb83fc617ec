//! Paperworm main entry point
//!
//! This is the command-line interface for the Paperworm crawl engine.

use clap::Parser;
use paperworm::config::load_config;
use paperworm::crawler::{run_spider, Shutdown};
use paperworm::ledger::FileLedger;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Paperworm: a resilient fetch-and-archive crawl engine
///
/// Paperworm fetches documents over HTTP with retries and charset
/// normalization, archives the raw text, and records every completed unit in
/// a durable ledger so interrupted crawls resume where they left off.
#[derive(Parser, Debug)]
#[command(name = "paperworm")]
#[command(version = "1.0.0")]
#[command(about = "A resilient fetch-and-archive crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, discarding the existing ledger
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(cfg) => {
            tracing::info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.fresh {
        tracing::info!("Starting fresh crawl, clearing ledger {}", config.ledger.path);
        FileLedger::new(&config.ledger.path).clear()?;
    } else {
        tracing::info!("Starting crawl (resumes from existing ledger if present)");
    }

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    match run_spider(&config, shutdown).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paperworm=info,warn"),
            1 => EnvFilter::new("paperworm=debug,info"),
            2 => EnvFilter::new("paperworm=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &paperworm::Config) {
    println!("=== Paperworm Dry Run ===\n");

    println!("Fetcher:");
    println!("  Retries: {}", config.fetcher.retries);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Backoff base: {}ms", config.fetcher.backoff_base_ms);
    println!(
        "  Delay range: {:.1}-{:.1}s",
        config.fetcher.delay_range.0, config.fetcher.delay_range.1
    );
    println!("  Concurrency: {}", config.fetcher.concurrency);

    println!("\nArchive:");
    println!("  Root: {}", config.archive.root);
    println!("  Default category: {}", config.archive.category);

    println!("\nLedger:");
    println!("  Path: {}", config.ledger.path);

    println!("\nSpider '{}':", config.spider.name);
    println!("  Mode: {:?}", config.spider.mode);
    println!("  Max items: {}", config.spider.max_items);
    if let Some(start) = &config.spider.start_url {
        println!("  Start URL: {}", start);
    }
    if !config.spider.seeds.is_empty() {
        println!("  Seeds ({}):", config.spider.seeds.len());
        for seed in &config.spider.seeds {
            println!("    - {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
}
