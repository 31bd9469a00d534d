//! Storage abstractions for the date-partitioned datasets.
//!
//! Every dataset is a directory of per-date partitions, each holding a
//! single Parquet file:
//!
//! ```text
//! storage/
//! ├── bronze/car_listings/date=YYYY-MM-DD/data.parquet    # captures
//! ├── silver/car_listings/date=YYYY-MM-DD/data.parquet    # cleaned
//! └── gold/city_analytics/date=YYYY-MM-DD/data.parquet    # aggregated
//! ```
//!
//! A partition is keyed by `(kind, date)`. [`save`] replaces the previous
//! artifact; captures go through [`append`] so earlier runs of the same
//! day are kept.

pub mod columnar;
pub mod local;

use std::fmt;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::Result;

pub use local::LocalStorage;

/// The three datasets the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Capture,
    Cleaned,
    Aggregated,
}

impl DatasetKind {
    /// Directory prefix relative to the storage root.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Capture => "bronze/car_listings",
            Self::Cleaned => "silver/car_listings",
            Self::Aggregated => "gold/city_analytics",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Cleaned => "cleaned",
            Self::Aggregated => "aggregated",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replace the artifact for `(kind, date)`. Returns its location.
    async fn write_artifact(&self, kind: DatasetKind, date: NaiveDate, bytes: &[u8])
    -> Result<String>;

    /// Read the artifact for `(kind, date)`, or `None` if absent.
    async fn read_artifact(&self, kind: DatasetKind, date: NaiveDate) -> Result<Option<Vec<u8>>>;

    /// Dates that have an artifact for `kind`, oldest first.
    async fn list_partitions(&self, kind: DatasetKind) -> Result<Vec<NaiveDate>>;

    /// Write a named JSON document next to the partition's artifact.
    async fn write_sidecar(
        &self,
        kind: DatasetKind,
        date: NaiveDate,
        name: &str,
        bytes: &[u8],
    ) -> Result<String>;
}

/// A row type with a fixed columnar schema.
pub trait Dataset: Sized {
    const KIND: DatasetKind;

    fn schema() -> SchemaRef;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

/// Encode rows as a Parquet file held in memory.
pub fn encode<T: Dataset>(rows: &[T]) -> Result<Vec<u8>> {
    let batch = T::to_batch(rows)?;
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

/// Decode a Parquet file into rows, validating the schema on the way.
pub fn decode<T: Dataset>(bytes: Vec<u8>) -> Result<Vec<T>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(T::from_batch(&batch?)?);
    }
    Ok(rows)
}

/// Persist `rows` as the `T::KIND` partition for `date`.
pub async fn save<T: Dataset>(
    store: &dyn ArtifactStore,
    date: NaiveDate,
    rows: &[T],
) -> Result<String> {
    let bytes = encode(rows)?;
    let location = store.write_artifact(T::KIND, date, &bytes).await?;
    log::info!(
        "Saved {} {} rows to {}",
        rows.len(),
        T::KIND,
        location
    );
    Ok(location)
}

/// Add `rows` to the end of the `T::KIND` partition for `date`.
///
/// Returns the location and the partition's total row count.
pub async fn append<T: Dataset>(
    store: &dyn ArtifactStore,
    date: NaiveDate,
    rows: Vec<T>,
) -> Result<(String, usize)> {
    let mut partition = load_partition::<T>(store, date).await?.unwrap_or_default();
    if !partition.is_empty() {
        log::info!(
            "Appending {} rows to {} existing {} rows for {}",
            rows.len(),
            partition.len(),
            T::KIND,
            date
        );
    }
    partition.extend(rows);
    let location = save(store, date, &partition).await?;
    Ok((location, partition.len()))
}

/// Load a single partition, or `None` if it was never written.
pub async fn load_partition<T: Dataset>(
    store: &dyn ArtifactStore,
    date: NaiveDate,
) -> Result<Option<Vec<T>>> {
    match store.read_artifact(T::KIND, date).await? {
        Some(bytes) => Ok(Some(decode(bytes)?)),
        None => Ok(None),
    }
}

/// Load every partition of `T::KIND`, oldest partition first.
pub async fn load_all<T: Dataset>(store: &dyn ArtifactStore) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    for date in store.list_partitions(T::KIND).await? {
        if let Some(part) = load_partition::<T>(store, date).await? {
            log::debug!("Loaded {} {} rows from {}", part.len(), T::KIND, date);
            rows.extend(part);
        }
    }
    Ok(rows)
}

/// Load the most recent partition of `T::KIND`.
pub async fn load_latest<T: Dataset>(
    store: &dyn ArtifactStore,
) -> Result<Option<(NaiveDate, Vec<T>)>> {
    let Some(date) = store.list_partitions(T::KIND).await?.pop() else {
        return Ok(None);
    };
    Ok(load_partition::<T>(store, date)
        .await?
        .map(|rows| (date, rows)))
}
