//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── {layer}/{dataset}/
//!     └── date=YYYY-MM-DD/
//!         ├── data.parquet    # the partition's artifact
//!         └── stats.json      # run statistics (capture only)
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{ArtifactStore, DatasetKind};

const ARTIFACT_FILE: &str = "data.parquet";
const PARTITION_PREFIX: &str = "date=";
const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn dataset_dir(&self, kind: DatasetKind) -> PathBuf {
        self.root_dir.join(kind.prefix())
    }

    fn partition_dir(&self, kind: DatasetKind, date: NaiveDate) -> PathBuf {
        self.dataset_dir(kind).join(format!(
            "{}{}",
            PARTITION_PREFIX,
            date.format(PARTITION_DATE_FORMAT)
        ))
    }

    /// Path of the artifact for `(kind, date)`, whether or not it exists.
    pub fn artifact_path(&self, kind: DatasetKind, date: NaiveDate) -> PathBuf {
        self.partition_dir(kind, date).join(ARTIFACT_FILE)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

fn parse_partition(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(PARTITION_PREFIX)?;
    NaiveDate::parse_from_str(date, PARTITION_DATE_FORMAT).ok()
}

#[async_trait]
impl ArtifactStore for LocalStorage {
    async fn write_artifact(
        &self,
        kind: DatasetKind,
        date: NaiveDate,
        bytes: &[u8],
    ) -> Result<String> {
        let path = self.artifact_path(kind, date);
        self.write_bytes(&path, bytes).await?;
        Ok(path.display().to_string())
    }

    async fn read_artifact(&self, kind: DatasetKind, date: NaiveDate) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&self.artifact_path(kind, date)).await
    }

    async fn list_partitions(&self, kind: DatasetKind) -> Result<Vec<NaiveDate>> {
        let dir = self.dataset_dir(kind);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(parse_partition) else {
                log::debug!("Skipping non-partition entry {:?} in {}", name, dir.display());
                continue;
            };
            if tokio::fs::try_exists(entry.path().join(ARTIFACT_FILE)).await? {
                dates.push(date);
            }
        }

        dates.sort();
        Ok(dates)
    }

    async fn write_sidecar(
        &self,
        kind: DatasetKind,
        date: NaiveDate,
        name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let path = self.partition_dir(kind, date).join(name);
        self.write_bytes(&path, bytes).await?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityAggregate, DealerType, ListingRecord};
    use crate::storage::{load_all, load_latest, load_partition, save};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn listing(link: &str, date: NaiveDate) -> ListingRecord {
        ListingRecord {
            year: "2011".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            title: "2011 Honda Civic".to_string(),
            price: "$4,200".to_string(),
            mileage: "120,000".to_string(),
            dealer_type: DealerType::Owner,
            location: "unknown".to_string(),
            link: link.to_string(),
            source_city: "Boston".to_string(),
            capture_date: date,
        }
    }

    #[test]
    fn test_partition_layout() {
        let storage = LocalStorage::new("/data");
        assert_eq!(
            storage.artifact_path(DatasetKind::Cleaned, day(3)),
            PathBuf::from("/data/silver/car_listings/date=2025-06-03/data.parquet")
        );
        assert_eq!(parse_partition("date=2025-06-03"), Some(day(3)));
        assert_eq!(parse_partition("date=bad"), None);
        assert_eq!(parse_partition("_tmp"), None);
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_artifact(DatasetKind::Capture, day(1), b"hello")
            .await
            .unwrap();
        let data = storage.read_artifact(DatasetKind::Capture, day(1)).await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!storage
            .artifact_path(DatasetKind::Capture, day(1))
            .with_extension("tmp")
            .exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_artifact(DatasetKind::Aggregated, day(1)).await.unwrap();
        assert!(data.is_none());
        assert!(storage.list_partitions(DatasetKind::Aggregated).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_key_replaces_partition() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        save(&storage, day(2), &[listing("https://x/1", day(2)), listing("https://x/2", day(2))])
            .await
            .unwrap();
        save(&storage, day(2), &[listing("https://x/3", day(2))]).await.unwrap();

        let rows: Vec<ListingRecord> = load_partition(&storage, day(2)).await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].link, "https://x/3");
    }

    #[tokio::test]
    async fn test_load_all_orders_partitions_by_date() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        save(&storage, day(9), &[listing("https://x/late", day(9))]).await.unwrap();
        save(&storage, day(4), &[listing("https://x/early", day(4))]).await.unwrap();
        // stray directories are ignored
        tokio::fs::create_dir_all(tmp.path().join("bronze/car_listings/notes"))
            .await
            .unwrap();

        assert_eq!(
            storage.list_partitions(DatasetKind::Capture).await.unwrap(),
            vec![day(4), day(9)]
        );
        let rows: Vec<ListingRecord> = load_all(&storage).await.unwrap();
        let links: Vec<&str> = rows.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://x/early", "https://x/late"]);

        let (date, latest) = load_latest::<ListingRecord>(&storage).await.unwrap().unwrap();
        assert_eq!(date, day(9));
        assert_eq!(latest.len(), 1);
    }

    #[tokio::test]
    async fn test_kinds_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        save(&storage, day(1), &[listing("https://x/1", day(1))]).await.unwrap();
        let aggregates: Option<Vec<CityAggregate>> =
            load_partition(&storage, day(1)).await.unwrap();
        assert!(aggregates.is_none());
    }

    #[tokio::test]
    async fn test_sidecar_sits_next_to_artifact() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let location = storage
            .write_sidecar(DatasetKind::Capture, day(5), "stats.json", b"{}")
            .await
            .unwrap();
        assert!(location.ends_with("date=2025-06-05/stats.json"));
        // a sidecar alone does not make a partition
        assert!(storage.list_partitions(DatasetKind::Capture).await.unwrap().is_empty());
    }
}
