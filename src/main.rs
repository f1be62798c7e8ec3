//! Agora main entry point
//!
//! Command-line interface for the grocery price scanner.

use agora::config::{load_config_with_hash, Config};
use agora::report::{print_report, report_to_json};
use agora::scrape::run_scan;
use agora::AgoraError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Agora: a concurrent grocery price scanner
///
/// Scrapes the configured retailers, ranks products by unit price, and
/// records price changes over time in SQLite.
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(version)]
#[command(about = "A concurrent grocery price scanner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only scan these stores (repeatable, or comma-separated)
    #[arg(long, value_delimiter = ',')]
    stores: Vec<String>,

    /// Override the configured database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Validate config and show what would be scanned without scanning
    #[arg(long)]
    dry_run: bool,

    /// Run summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        print_plan(&config);
        return Ok(());
    }

    // Cancel all workers and the retry loop on Ctrl-C
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after in-flight fetches");
                cancel.cancel();
            }
        });
    }

    match run_scan(config, cancel).await {
        Ok(report) => {
            match cli.format {
                OutputFormat::Text => print_report(&report),
                OutputFormat::Json => println!("{:#}", report_to_json(&report)),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("scan failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("agora=info,warn"),
            1 => EnvFilter::new("agora=debug,info"),
            2 => EnvFilter::new("agora=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Applies CLI overrides: store filter and database path
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), AgoraError> {
    if !cli.stores.is_empty() {
        for requested in &cli.stores {
            if !config.stores.iter().any(|s| s.name() == requested) {
                return Err(AgoraError::UnknownStore(requested.clone()));
            }
        }
        config
            .stores
            .retain(|s| cli.stores.iter().any(|name| name == s.name()));
    }

    if let Some(database) = &cli.database {
        config.output.database_path = database.display().to_string();
    }

    Ok(())
}

/// Prints what a run with this configuration would do
fn print_plan(config: &Config) {
    println!("=== Agora Dry Run ===\n");

    println!("Crawler:");
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  API pacing: {}-{} ms",
        config.pacing.min_millis, config.pacing.max_millis
    );
    println!("  Max retry rounds: {}", config.retry.max_rounds);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nStores ({}):", config.stores.len());
    for store in &config.stores {
        match store {
            agora::config::StoreConfig::Html(cfg) => {
                println!("  - {} (html): {}", cfg.name, cfg.categories_url);
            }
            agora::config::StoreConfig::Api(cfg) => {
                println!("  - {} (api): {}", cfg.name, cfg.navigation_url);
            }
        }
    }

    println!("\n✓ Configuration is valid");
}
