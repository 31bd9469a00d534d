// src/pipeline/refine.rs

//! Refinement: captures to cleaned rows to city aggregates.
//!
//! Each stage reads the previous stage's persisted artifact, so a stage
//! can be re-run on its own.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{CityAggregate, CleanedRecord};
use crate::services::{aggregate, clean};
use crate::storage::{self, ArtifactStore};

use super::load::load_captures;

#[derive(Debug, Clone)]
pub struct RefineSummary {
    pub processing_date: NaiveDate,
    pub captured: usize,
    pub cleaned: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub cities: usize,
    pub cleaned_location: String,
    pub aggregated_location: String,
}

/// Rebuild the cleaned and aggregated partitions for `processing_date`.
pub async fn run_refinement(
    storage: &dyn ArtifactStore,
    processing_date: NaiveDate,
) -> Result<RefineSummary> {
    let captures = load_captures(storage).await?;
    let captured = captures.len();

    let outcome = clean(captures);
    let cleaned_location =
        storage::save::<CleanedRecord>(storage, processing_date, &outcome.records).await?;

    let cleaned: Vec<CleanedRecord> = storage::load_partition(storage, processing_date)
        .await?
        .ok_or_else(|| {
            AppError::validation(format!("cleaned partition {processing_date} vanished after write"))
        })?;
    let aggregates = aggregate(&cleaned);
    let aggregated_location =
        storage::save::<CityAggregate>(storage, processing_date, &aggregates).await?;

    log::info!(
        "Refined {} captured rows into {} cleaned rows across {} cities",
        captured,
        cleaned.len(),
        aggregates.len()
    );

    Ok(RefineSummary {
        processing_date,
        captured,
        cleaned: cleaned.len(),
        duplicates: outcome.duplicates,
        rejected: outcome.rejected,
        cities: aggregates.len(),
        cleaned_location,
        aggregated_location,
    })
}
