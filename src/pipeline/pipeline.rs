// src/pipeline/pipeline.rs

use chrono::Local;

use crate::error::Result;
use crate::models::Config;
use crate::storage::ArtifactStore;

use super::refine::{RefineSummary, run_refinement};
use super::scrape::{ScrapeSummary, run_scraper};

/// Run the full pipeline: scrape, then refine.
///
/// Refinement only starts once the capture artifact is on disk.
pub async fn run_pipeline(
    config: &Config,
    storage: &dyn ArtifactStore,
) -> Result<(ScrapeSummary, RefineSummary)> {
    log::info!("[STEP 1/2] Scrape - capturing listings");
    let scraped = run_scraper(config, storage).await?;

    log::info!("[STEP 2/2] Refine - cleaning and aggregating");
    let refined = run_refinement(storage, Local::now().date_naive()).await?;

    log::info!("Pipeline complete");
    Ok((scraped, refined))
}
