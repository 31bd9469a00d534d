// src/pipeline/load.rs

use crate::error::Result;
use crate::models::ListingRecord;
use crate::storage::{self, ArtifactStore};

/// Load every capture partition into one raw dataset, oldest first.
pub async fn load_captures(storage: &dyn ArtifactStore) -> Result<Vec<ListingRecord>> {
    let records: Vec<ListingRecord> = storage::load_all(storage).await?;
    log::info!("Loaded {} captured listings", records.len());
    Ok(records)
}
