// src/pipeline/info.rs

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{CityAggregate, CleanedRecord, ListingRecord};
use crate::storage::{self, ArtifactStore, Dataset, DatasetKind};

/// One stored partition and its row count.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionInfo {
    pub kind: DatasetKind,
    pub date: NaiveDate,
    pub rows: usize,
}

async fn partitions_of<T: Dataset>(storage: &dyn ArtifactStore) -> Result<Vec<PartitionInfo>> {
    let mut info = Vec::new();
    for date in storage.list_partitions(T::KIND).await? {
        let rows = storage::load_partition::<T>(storage, date)
            .await?
            .map_or(0, |rows| rows.len());
        info.push(PartitionInfo {
            kind: T::KIND,
            date,
            rows,
        });
    }
    Ok(info)
}

/// Every partition of every dataset, capture first.
pub async fn run_info(storage: &dyn ArtifactStore) -> Result<Vec<PartitionInfo>> {
    let mut info = partitions_of::<ListingRecord>(storage).await?;
    info.extend(partitions_of::<CleanedRecord>(storage).await?);
    info.extend(partitions_of::<CityAggregate>(storage).await?);
    Ok(info)
}
