// src/pipeline/ingest.rs

//! Import of legacy CSV captures into the capture dataset.
//!
//! Two header spellings exist in old exports (`year,...,city,scrape_date`
//! and `Year,...,City,Scrape_Date`). Headers are matched case-insensitively
//! and the legacy `N/A` sentinel becomes [`UNKNOWN`].

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{DealerType, ListingRecord, UNKNOWN};
use crate::services::dealer_type;
use crate::storage::{self, ArtifactStore};

const LEGACY_MISSING: &str = "N/A";

/// Column names after normalisation, with legacy aliases.
const COLUMNS: [(&str, &[&str]); 11] = [
    ("year", &[]),
    ("make", &[]),
    ("model", &[]),
    ("title", &[]),
    ("price", &[]),
    ("mileage", &[]),
    ("dealer_type", &[]),
    ("location", &[]),
    ("link", &[]),
    ("source_city", &["city"]),
    ("capture_date", &["scrape_date"]),
];

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub rows: usize,
    /// Rows without a usable capture date or link
    pub skipped: usize,
    /// Rows added per capture partition
    pub partitions: BTreeMap<NaiveDate, usize>,
}

/// Rows parsed from one CSV export.
#[derive(Debug, Default)]
pub struct LegacyRows {
    pub records: Vec<ListingRecord>,
    pub skipped: usize,
}

fn column_index(headers: &csv::StringRecord) -> Result<[usize; 11]> {
    let positions: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let mut index = [0usize; 11];
    for (slot, (name, aliases)) in index.iter_mut().zip(COLUMNS.iter()) {
        *slot = std::iter::once(name)
            .chain(aliases.iter())
            .find_map(|n| positions.get(*n).copied())
            .ok_or_else(|| AppError::schema(format!("legacy CSV is missing column '{name}'")))?;
    }
    Ok(index)
}

fn cell(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") | Some(LEGACY_MISSING) => UNKNOWN.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Accepts `2025-06-01` with or without a trailing time.
fn parse_capture_date(value: &str) -> Option<NaiveDate> {
    let date = value.trim().split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Parse one legacy export.
pub fn read_legacy_csv(reader: impl Read) -> Result<LegacyRows> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let index = column_index(rdr.headers()?)?;
    let mut rows = LegacyRows::default();

    for row in rdr.records() {
        let row = row?;
        let field = |column: usize| cell(row.get(index[column]));

        let link = field(8);
        let Some(capture_date) = row.get(index[10]).and_then(parse_capture_date) else {
            rows.skipped += 1;
            continue;
        };
        if link == UNKNOWN {
            rows.skipped += 1;
            continue;
        }

        let dealer = field(6)
            .parse::<DealerType>()
            .unwrap_or_else(|_| dealer_type(&link));

        rows.records.push(ListingRecord {
            year: field(0),
            make: field(1),
            model: field(2),
            title: row.get(index[3]).unwrap_or_default().trim().to_string(),
            price: field(4),
            mileage: field(5),
            dealer_type: dealer,
            location: field(7),
            link,
            source_city: field(9),
            capture_date,
        });
    }
    Ok(rows)
}

/// Append legacy CSV exports to the capture partitions of their dates.
pub async fn run_ingest(storage: &dyn ArtifactStore, paths: &[impl AsRef<Path>]) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut by_date: BTreeMap<NaiveDate, Vec<ListingRecord>> = BTreeMap::new();

    for path in paths {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let parsed = read_legacy_csv(bytes.as_slice())?;
        log::info!(
            "Read {} rows from {} ({} skipped)",
            parsed.records.len(),
            path.display(),
            parsed.skipped
        );
        summary.skipped += parsed.skipped;
        for record in parsed.records {
            by_date.entry(record.capture_date).or_default().push(record);
        }
    }

    for (date, records) in by_date {
        summary.rows += records.len();
        summary.partitions.insert(date, records.len());
        storage::append(storage, date, records).await?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    const LOWERCASE: &str = "\
year,make,model,title,price,mileage,dealer_type,location,link,city,scrape_date
2015,Toyota,Camry,2015 Toyota Camry,\"$5,500\",45k,Owner,Lakeview,https://chicago.craigslist.org/cto/d/1.html,Chicago,2024-11-02
N/A,N/A,N/A,Project car,$900,N/A,Dealer,N/A,https://chicago.craigslist.org/ctd/d/2.html,Chicago,2024-11-02
";

    const CAPITALIZED: &str = "\
Year,Make,Model,Title,Price,Mileage,Dealer_Type,Location,Link,City,Scrape_Date
2010,Honda,Civic,2010 Honda Civic,$3000,,,Mission,https://sfbay.craigslist.org/ctd/d/3.html,San Francisco Bay Area,2024-10-30 08:15:00
2012,Ford,Focus,2012 Ford Focus,$4000,,,,https://sfbay.craigslist.org/cto/d/4.html,San Francisco Bay Area,not a date
";

    #[test]
    fn test_lowercase_headers() {
        let rows = read_legacy_csv(LOWERCASE.as_bytes()).unwrap();
        assert_eq!(rows.records.len(), 2);
        assert_eq!(rows.skipped, 0);

        let camry = &rows.records[0];
        assert_eq!(camry.price, "$5,500");
        assert_eq!(camry.source_city, "Chicago");
        assert_eq!(camry.dealer_type, DealerType::Owner);

        let project = &rows.records[1];
        assert_eq!(project.year, UNKNOWN);
        assert_eq!(project.make, UNKNOWN);
        assert_eq!(project.location, UNKNOWN);
    }

    #[test]
    fn test_capitalized_headers() {
        let rows = read_legacy_csv(CAPITALIZED.as_bytes()).unwrap();
        assert_eq!(rows.records.len(), 1);
        assert_eq!(rows.skipped, 1);

        let civic = &rows.records[0];
        assert_eq!(civic.capture_date, NaiveDate::from_ymd_opt(2024, 10, 30).unwrap());
        assert_eq!(civic.mileage, UNKNOWN);
        // empty dealer type falls back to the link shape
        assert_eq!(civic.dealer_type, DealerType::Dealer);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let err = read_legacy_csv("year,make\n2015,Toyota\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[tokio::test]
    async fn test_ingest_appends_to_partition() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let csv_path = tmp.path().join("car_listings_20241102_101500.csv");
        tokio::fs::write(&csv_path, LOWERCASE).await.unwrap();

        let first = run_ingest(&storage, &[&csv_path]).await.unwrap();
        assert_eq!(first.rows, 2);
        run_ingest(&storage, &[&csv_path]).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();
        let rows: Vec<ListingRecord> = storage::load_partition(&storage, date).await.unwrap().unwrap();
        assert_eq!(rows.len(), 4);
    }
}
