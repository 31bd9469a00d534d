// src/pipeline/report.rs

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CityAggregate, CleanedRecord};
use crate::services::report::{
    CityRankings, MakeStats, MarketSummary, city_rankings, make_stats, market_summary,
};
use crate::storage::{self, ArtifactStore};

/// Dashboard views over the latest cleaned and aggregated partitions.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub cleaned_date: Option<NaiveDate>,
    pub aggregated_date: Option<NaiveDate>,
    pub market: MarketSummary,
    pub rankings: CityRankings,
    pub makes: Vec<MakeStats>,
}

pub async fn run_report(storage: &dyn ArtifactStore) -> Result<Report> {
    let (cleaned_date, cleaned) = match storage::load_latest::<CleanedRecord>(storage).await? {
        Some((date, rows)) => (Some(date), rows),
        None => (None, Vec::new()),
    };
    let (aggregated_date, aggregates) = match storage::load_latest::<CityAggregate>(storage).await? {
        Some((date, rows)) => (Some(date), rows),
        None => (None, Vec::new()),
    };
    if cleaned_date.is_none() {
        log::warn!("No cleaned data found, run refinement first");
    }

    Ok(Report {
        cleaned_date,
        aggregated_date,
        market: market_summary(&cleaned),
        rankings: city_rankings(&aggregates),
        makes: make_stats(&cleaned),
    })
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

impl Report {
    /// Plain-text rendering for the terminal.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "none".to_string(), |d| d.to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.market;
        writeln!(f, "Market summary (cleaned {})", date_label(self.cleaned_date))?;
        writeln!(f, "    Total listings: {}", m.total_listings)?;
        writeln!(f, "    Average price: {}", amount(m.avg_price))?;
        writeln!(f, "    Median price: {}", amount(m.median_price))?;
        writeln!(f, "    Average mileage: {}", amount(m.avg_mileage))?;
        writeln!(f, "    Top make: {}", m.top_make.as_deref().unwrap_or("-"))?;
        writeln!(f, "    Cities: {}", m.cities_count)?;

        writeln!(f, "City rankings (aggregated {})", date_label(self.aggregated_date))?;
        writeln!(f, "  Highest average price")?;
        for city in &self.rankings.highest_prices {
            writeln!(f, "    {}: {:.2}", city.source_city, city.avg_price)?;
        }
        writeln!(f, "  Lowest average price")?;
        for city in &self.rankings.lowest_prices {
            writeln!(f, "    {}: {:.2}", city.source_city, city.avg_price)?;
        }
        writeln!(f, "  Most inventory")?;
        for city in &self.rankings.most_inventory {
            writeln!(f, "    {}: {}", city.source_city, city.listing_count)?;
        }

        writeln!(f, "Makes")?;
        for make in &self.makes {
            writeln!(
                f,
                "    {}: {} listings, avg price {}, avg mileage {}",
                make.make,
                make.count,
                amount(make.avg_price),
                amount(make.avg_mileage)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealerType, ListingRecord};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn cleaned(link: &str, make: &str, price: f64) -> CleanedRecord {
        CleanedRecord {
            listing: ListingRecord {
                year: "2019".to_string(),
                make: make.to_string(),
                model: "unknown".to_string(),
                title: format!("2019 {make}"),
                price: format!("${price}"),
                mileage: "unknown".to_string(),
                dealer_type: DealerType::Private,
                location: "unknown".to_string(),
                link: link.to_string(),
                source_city: "Seattle".to_string(),
                capture_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            },
            price_value: Some(price),
            mileage_value: None,
        }
    }

    #[tokio::test]
    async fn test_report_reads_latest_partition_only() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let older = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let newer = NaiveDate::from_ymd_opt(2025, 7, 2).unwrap();

        storage::save(&storage, older, &[cleaned("https://s/1", "Kia", 8000.0)])
            .await
            .unwrap();
        storage::save(
            &storage,
            newer,
            &[
                cleaned("https://s/1", "Kia", 8000.0),
                cleaned("https://s/2", "Subaru", 12000.0),
            ],
        )
        .await
        .unwrap();

        let report = run_report(&storage).await.unwrap();
        assert_eq!(report.cleaned_date, Some(newer));
        assert_eq!(report.aggregated_date, None);
        assert_eq!(report.market.total_listings, 2);
        assert_eq!(report.market.avg_price, Some(10000.0));
        assert!(report.rankings.highest_prices.is_empty());

        let text = report.render();
        assert!(text.contains("Total listings: 2"));
        assert_eq!(text.matches("Average price:").count(), 1);
        assert!(text.contains("Subaru: 1 listings"));
    }
}
