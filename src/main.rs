//! mtharvest main entry point
//!
//! Command-line interface for the autonomous MTProto proxy harvester.

use anyhow::Context;
use clap::Parser;
use mtharvest::config::load_config_with_hash;
use mtharvest::extract::BUILTIN_PATTERNS;
use mtharvest::harvester::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mtharvest: an autonomous MTProto proxy harvester
///
/// Continuously sweeps the configured source list, extracts proxy records
/// from whatever format they are published in, deduplicates them, and
/// keeps two checkpoint artifacts (JSON and plain list) up to date until
/// interrupted.
#[derive(Parser, Debug)]
#[command(name = "mtharvest")]
#[command(version = "1.0.0")]
#[command(about = "An autonomous MTProto proxy harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    print_banner(&config);

    let coordinator = Coordinator::new(config).context("failed to initialize harvester")?;

    // Ctrl+C / SIGTERM flips the shared cancellation flag; in-flight
    // fetches finish and a final checkpoint is written before exit.
    let cancel = coordinator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, performing graceful shutdown");
            cancel.cancel();
        }
    });

    coordinator.run().await.context("harvest failed")?;

    println!("Harvest complete. Check the checkpoint artifacts for results.");
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mtharvest=info,warn"),
            1 => EnvFilter::new("mtharvest=debug,info"),
            2 => EnvFilter::new("mtharvest=trace,debug"),
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

/// Prints the startup summary before a real run
fn print_banner(config: &mtharvest::Config) {
    println!("==========================================");
    println!("mtharvest - MTProto proxy harvester");
    println!("Sources: {}", config.sources.len());
    println!(
        "Patterns: {} built-in + {} extra",
        BUILTIN_PATTERNS.len(),
        config.extra_patterns.len()
    );
    println!("Store capacity: {}", config.harvester.store_capacity);
    println!("Concurrency: {}", config.harvester.concurrency_limit);
    println!(
        "Checkpoints: {} / {} every {}s",
        config.checkpoint.json_path, config.checkpoint.list_path, config.checkpoint.interval_secs
    );
    println!("==========================================");
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &mtharvest::Config) {
    println!("=== mtharvest Dry Run ===\n");

    println!("Harvester:");
    println!("  Concurrency limit: {}", config.harvester.concurrency_limit);
    println!("  Store capacity: {}", config.harvester.store_capacity);
    println!("  Cycle delay: {}s", config.harvester.cycle_delay_secs);
    println!("  Candidate budget: {}", config.harvester.candidate_budget);

    println!("\nFetch:");
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!("  Max body size: {} bytes", config.fetch.max_body_bytes);
    println!("  Max retries: {}", config.fetch.max_retries);

    println!("\nCheckpoint:");
    println!("  JSON artifact: {}", config.checkpoint.json_path);
    println!("  List artifact: {}", config.checkpoint.list_path);
    println!("  Interval: {}s", config.checkpoint.interval_secs);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {}", source);
    }

    if config.user_agents.is_empty() {
        println!("\nUser agents: built-in pool");
    } else {
        println!("\nUser agents: {} configured", config.user_agents.len());
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} sources with {} extraction patterns",
        config.sources.len(),
        BUILTIN_PATTERNS.len() + config.extra_patterns.len()
    );
}
