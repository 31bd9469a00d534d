//! Vehicle listing scraper CLI
//!
//! Entry points for the scheduler (`scrape`, `refine`, `run`) and for
//! operators (`ingest`, `report`, `validate`, `info`).

use std::path::PathBuf;

use autoscrape::{error::Result, models::Config, pipeline, storage::LocalStorage};
use chrono::Local;
use clap::{Parser, Subcommand};

/// autoscrape - City Vehicle Listing Scraper
#[derive(Parser, Debug)]
#[command(
    name = "autoscrape",
    version,
    about = "Scrapes city vehicle listings into cleaned and aggregated datasets"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Storage root for artifacts (overrides `storage.root`)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape every source into today's capture partition
    Scrape,

    /// Clean all captures and aggregate by city
    Refine,

    /// Run full pipeline: Scrape → Refine
    Run,

    /// Import legacy CSV captures
    Ingest {
        /// CSV files exported by the old scraper
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show market summary, city rankings and make statistics
    Report {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration
    Validate,

    /// List stored partitions
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    let storage_root = cli.storage_dir.unwrap_or_else(|| config.storage.root.clone());
    let storage = LocalStorage::new(&storage_root);

    match cli.command {
        Command::Scrape => {
            config.validate()?;
            let summary = pipeline::run_scraper(&config, &storage).await?;
            log::info!(
                "Scrape complete: {} listings, {} failed sources",
                summary.stats.record_count,
                summary.stats.source_failures.len()
            );
        }

        Command::Refine => {
            let summary = pipeline::run_refinement(&storage, Local::now().date_naive()).await?;
            log::info!("Cleaned data saved to {}", summary.cleaned_location);
            log::info!("Aggregates saved to {}", summary.aggregated_location);
        }

        Command::Run => {
            config.validate()?;
            pipeline::run_pipeline(&config, &storage).await?;
        }

        Command::Ingest { files } => {
            let summary = pipeline::run_ingest(&storage, &files).await?;
            for (date, rows) in &summary.partitions {
                log::info!("    {}: {} rows", date, rows);
            }
            log::info!(
                "Ingested {} rows ({} skipped)",
                summary.rows,
                summary.skipped
            );
        }

        Command::Report { json } => {
            let report = pipeline::run_report(&storage).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage_root.display());
            let partitions = pipeline::run_info(&storage).await?;
            if partitions.is_empty() {
                log::info!("No partitions found yet.");
            }
            for partition in partitions {
                log::info!(
                    "    {:<10} {}  {} rows",
                    partition.kind,
                    partition.date,
                    partition.rows
                );
            }
        }
    }

    Ok(())
}
