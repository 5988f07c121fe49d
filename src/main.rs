//! Catalog-Scout main entry point
//!
//! This is the command-line interface for the Catalog-Scout product scraper.

use anyhow::{bail, Context};
use catalog_scout::config::{load_config_with_hash, validate, Config, ExportFormat};
use catalog_scout::crawler::{ScrapeReport, Scraper};
use catalog_scout::output::{export_records, print_statistics};
use catalog_scout::url::parse_target;
use catalog_scout::ProductRecord;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Catalog-Scout: a resilient product catalog scraper
///
/// Catalog-Scout fetches product pages while rotating browser identities,
/// pacing requests and retrying through anti-bot pages, then exports the
/// extracted product data as CSV and JSON.
#[derive(Parser, Debug)]
#[command(name = "catalog-scout")]
#[command(version = "1.0.0")]
#[command(about = "A resilient product catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Also write log output to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Export format (repeatable; defaults to the configured formats)
    #[arg(long = "format", value_enum, global = true)]
    formats: Vec<ExportFormat>,

    /// Directory for exported files
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the given product pages
    Product {
        /// Product page URLs
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },

    /// Search the catalog and scrape the products found
    Search {
        /// Search keyword
        keyword: String,

        /// Number of result pages to walk
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Maximum number of products to scrape
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let config = load_run_config(&cli)?;
    let scraper = Scraper::new(&config).context("Failed to initialize scraper")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Scraping interrupted by user, finishing up");
            signal_token.cancel();
        }
    });

    let report = match &cli.command {
        Command::Product { urls } => handle_product(&scraper, urls, &cancel).await,
        Command::Search {
            keyword,
            pages,
            limit,
        } => handle_search(&scraper, keyword, *pages, *limit, &cancel).await?,
    };

    finish_run(&config, &report)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stderr and, when `log_file` is given, to that file as well.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_scout=info,warn"),
            1 => EnvFilter::new("catalog_scout=debug,info"),
            2 => EnvFilter::new("catalog_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Loads the configuration file, if any, and applies command-line overrides
fn load_run_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if !cli.formats.is_empty() {
        config.output.formats = cli.formats.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the `product` command: scrapes the given URLs in order
async fn handle_product(
    scraper: &Scraper,
    urls: &[String],
    cancel: &CancellationToken,
) -> ScrapeReport {
    let targets: Vec<String> = urls
        .iter()
        .filter_map(|url| match parse_target(url) {
            Ok(parsed) => Some(parsed.to_string()),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                None
            }
        })
        .collect();

    tracing::info!("Scraping {} product URLs", targets.len());
    scraper.scrape_all(&targets, cancel).await
}

/// Handles the `search` command: walks search pages, then scrapes the hits
async fn handle_search(
    scraper: &Scraper,
    keyword: &str,
    pages: u32,
    limit: usize,
    cancel: &CancellationToken,
) -> anyhow::Result<ScrapeReport> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        bail!("Search keyword must not be empty");
    }

    let report = scraper
        .search_and_scrape(keyword, pages, limit, cancel)
        .await;

    if report.stats.urls_attempted == 0 && !report.cancelled {
        println!("No products found for '{}'", keyword);
    }

    Ok(report)
}

/// Prints a sample of the results, exports them and shows the run statistics
fn finish_run(config: &Config, report: &ScrapeReport) -> anyhow::Result<()> {
    if report.cancelled {
        println!("\nScraping interrupted by user");
    }

    if report.records.is_empty() {
        println!("No products were successfully scraped");
    } else {
        println!("\nSuccessfully scraped {} products", report.records.len());
        print_sample(&report.records);
    }

    let written = export_records(
        &report.records,
        Path::new(&config.output.directory),
        &config.output.formats,
    )
    .context("Failed to export records")?;

    if !written.is_empty() {
        println!("\nFiles created:");
        for path in &written {
            println!("  - {}", path.display());
        }
    }

    println!();
    print_statistics(&report.stats);
    Ok(())
}

/// Prints the key fields of the first two records
fn print_sample(records: &[ProductRecord]) {
    println!("\nSample product data:");
    for (i, record) in records.iter().take(2).enumerate() {
        println!("\nProduct {}:", i + 1);
        println!("  Title: {}", record.title().unwrap_or("N/A"));
        println!("  Price: {}", record.price().unwrap_or("N/A"));
        println!("  Rating: {}", record.rating().unwrap_or("N/A"));
        println!("  ASIN: {}", record.identifier().unwrap_or("N/A"));
    }
}
