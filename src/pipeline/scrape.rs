// src/pipeline/scrape.rs

//! Scraping pipeline: each run appends its batch to the day's captures.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, ListingRecord};
use crate::services::{
    Extractor, ListingScraper, PageFetcher, SourceFailure, http_fetcher,
};
use crate::storage::{self, ArtifactStore, DatasetKind};

/// Name of the run statistics sidecar next to the capture artifact.
pub const STATS_FILE: &str = "stats.json";

/// Statistics for one scrape run, persisted as `stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capture_date: NaiveDate,
    pub record_count: usize,
    /// Rows in the day's capture partition after this run.
    pub partition_rows: usize,
    pub source_total: usize,
    pub source_succeeded: usize,
    pub listings_skipped: usize,
    pub source_failures: Vec<SourceFailure>,
}

impl ScrapeStats {
    pub fn success_rate(&self) -> f64 {
        if self.source_total == 0 {
            0.0
        } else {
            self.source_succeeded as f64 / self.source_total as f64
        }
    }
}

/// Where a scrape run's output went.
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub location: String,
    pub stats: ScrapeStats,
}

/// Run the scraper over every configured source with the HTTP fetcher.
pub async fn run_scraper(config: &Config, storage: &dyn ArtifactStore) -> Result<ScrapeSummary> {
    let fetcher = http_fetcher(&config.scraper)?;
    let capture_date = Local::now().date_naive();
    scrape_with(Arc::new(config.clone()), fetcher, storage, capture_date).await
}

/// Scrape with a caller-supplied fetcher and persist the batch.
///
/// The batch is appended even when every source failed; only a storage
/// failure fails the run. Rows from earlier runs or imports of the same
/// date are kept.
pub async fn scrape_with<F: PageFetcher>(
    config: Arc<Config>,
    fetcher: F,
    storage: &dyn ArtifactStore,
    capture_date: NaiveDate,
) -> Result<ScrapeSummary> {
    let start_time = Utc::now();
    log::info!(
        "Scraping {} sources for {} (concurrency {}, cap {})",
        config.sources.len(),
        capture_date,
        config.scraper.max_concurrent,
        config.scraper.listing_cap
    );

    let extractor = Arc::new(Extractor::new(&config.extraction)?);
    let scraper = ListingScraper::new(Arc::clone(&config), extractor, fetcher)?;
    let outcome = scraper.scrape_all(&config.sources, capture_date).await;

    for failure in &outcome.source_failures {
        log::warn!("Source {} ({}) failed: {}", failure.name, failure.code, failure.error);
    }
    if outcome.records.is_empty() {
        log::warn!("No listings captured, writing an empty batch");
    }

    let record_count = outcome.records.len();
    let (location, partition_rows) =
        storage::append::<ListingRecord>(storage, capture_date, outcome.records).await?;

    let stats = ScrapeStats {
        start_time,
        end_time: Utc::now(),
        capture_date,
        record_count,
        partition_rows,
        source_total: outcome.source_total,
        source_succeeded: outcome.source_total - outcome.source_failures.len(),
        listings_skipped: outcome.listings_skipped,
        source_failures: outcome.source_failures,
    };
    let stats_json = serde_json::to_vec_pretty(&stats)?;
    storage
        .write_sidecar(DatasetKind::Capture, capture_date, STATS_FILE, &stats_json)
        .await?;

    log::info!(
        "Captured {} listings from {}/{} sources ({:.0}%) into {}",
        stats.record_count,
        stats.source_succeeded,
        stats.source_total,
        stats.success_rate() * 100.0,
        location
    );

    Ok(ScrapeSummary { location, stats })
}
