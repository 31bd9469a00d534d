// src/services/report.rs

//! Read-only views over the cleaned and aggregated datasets.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::models::{CityAggregate, CleanedRecord};
use crate::services::aggregate::{mean, median, round2};

/// Entries shown in each city ranking.
pub const RANKING_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketSummary {
    pub total_listings: usize,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub avg_mileage: Option<f64>,
    /// Most frequent make, alphabetically first on a tie
    pub top_make: Option<String>,
    pub cities_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityPrice {
    pub source_city: String,
    pub avg_price: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityInventory {
    pub source_city: String,
    pub listing_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityRankings {
    pub highest_prices: Vec<CityPrice>,
    pub lowest_prices: Vec<CityPrice>,
    pub most_inventory: Vec<CityInventory>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MakeStats {
    pub make: String,
    pub avg_price: Option<f64>,
    pub count: usize,
    pub avg_mileage: Option<f64>,
}

pub fn market_summary(records: &[CleanedRecord]) -> MarketSummary {
    let prices: Vec<f64> = records.iter().filter_map(|r| r.price_value).collect();
    let mileages: Vec<f64> = records.iter().filter_map(|r| r.mileage_value).collect();

    let mut make_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *make_counts.entry(record.listing.make.as_str()).or_default() += 1;
    }
    let top_make = make_counts
        .into_iter()
        .max_by_key(|(make, count)| (*count, Reverse(*make)))
        .map(|(make, _)| make.to_string());

    let cities: HashSet<&str> = records
        .iter()
        .map(|r| r.listing.source_city.as_str())
        .collect();

    MarketSummary {
        total_listings: records.len(),
        avg_price: mean(&prices).map(round2),
        median_price: median(&prices).map(round2),
        avg_mileage: mean(&mileages).map(round2),
        top_make,
        cities_count: cities.len(),
    }
}

/// Top cities by average price (both ends) and by listing count.
///
/// Ties keep the input order.
pub fn city_rankings(aggregates: &[CityAggregate]) -> CityRankings {
    let price = |a: &CityAggregate| CityPrice {
        source_city: a.source_city.clone(),
        avg_price: a.avg_price,
    };

    let mut by_price: Vec<&CityAggregate> = aggregates.iter().collect();
    by_price.sort_by(|a, b| b.avg_price.total_cmp(&a.avg_price));
    let highest_prices = by_price.iter().take(RANKING_SIZE).map(|a| price(*a)).collect();

    by_price.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
    let lowest_prices = by_price.iter().take(RANKING_SIZE).map(|a| price(*a)).collect();

    let mut by_count: Vec<&CityAggregate> = aggregates.iter().collect();
    by_count.sort_by_key(|a| Reverse(a.listing_count));
    let most_inventory = by_count
        .iter()
        .take(RANKING_SIZE)
        .map(|a| CityInventory {
            source_city: a.source_city.clone(),
            listing_count: a.listing_count,
        })
        .collect();

    CityRankings {
        highest_prices,
        lowest_prices,
        most_inventory,
    }
}

/// Per-make price and mileage statistics, ordered by make.
pub fn make_stats(records: &[CleanedRecord]) -> Vec<MakeStats> {
    let mut groups: BTreeMap<&str, Vec<&CleanedRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.listing.make.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(make, rows)| {
            let prices: Vec<f64> = rows.iter().filter_map(|r| r.price_value).collect();
            let mileages: Vec<f64> = rows.iter().filter_map(|r| r.mileage_value).collect();
            MakeStats {
                make: make.to_string(),
                avg_price: mean(&prices).map(round2),
                count: prices.len(),
                avg_mileage: mean(&mileages).map(round2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealerType, ListingRecord};
    use chrono::NaiveDate;

    fn record(make: &str, city: &str, price: f64, mileage: Option<f64>) -> CleanedRecord {
        CleanedRecord {
            listing: ListingRecord {
                year: "2016".to_string(),
                make: make.to_string(),
                model: "unknown".to_string(),
                title: format!("2016 {make}"),
                price: format!("${price}"),
                mileage: "unknown".to_string(),
                dealer_type: DealerType::Dealer,
                location: "unknown".to_string(),
                link: format!("https://{city}/{make}/{price}"),
                source_city: city.to_string(),
                capture_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            },
            price_value: Some(price),
            mileage_value: mileage,
        }
    }

    fn city(name: &str, avg_price: f64, listing_count: u64) -> CityAggregate {
        CityAggregate {
            source_city: name.to_string(),
            avg_price,
            median_price: avg_price,
            listing_count,
            avg_mileage: None,
            avg_year: 2015.0,
        }
    }

    #[test]
    fn test_market_summary() {
        let summary = market_summary(&[
            record("Toyota", "Boston", 1000.0, Some(10_000.0)),
            record("Honda", "Boston", 2000.0, None),
            record("Toyota", "Miami", 6000.0, Some(30_000.0)),
        ]);
        assert_eq!(summary.total_listings, 3);
        assert_eq!(summary.avg_price, Some(3000.0));
        assert_eq!(summary.median_price, Some(2000.0));
        assert_eq!(summary.avg_mileage, Some(20_000.0));
        assert_eq!(summary.top_make.as_deref(), Some("Toyota"));
        assert_eq!(summary.cities_count, 2);
    }

    #[test]
    fn test_top_make_tie_is_alphabetical() {
        let summary = market_summary(&[
            record("Toyota", "Boston", 1000.0, None),
            record("Honda", "Boston", 2000.0, None),
        ]);
        assert_eq!(summary.top_make.as_deref(), Some("Honda"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = market_summary(&[]);
        assert_eq!(summary.total_listings, 0);
        assert_eq!(summary.avg_price, None);
        assert_eq!(summary.top_make, None);
    }

    #[test]
    fn test_city_rankings() {
        let aggregates: Vec<CityAggregate> = (1..=7)
            .map(|i| city(&format!("City{i}"), 1000.0 * i as f64, 10 - i))
            .collect();
        let rankings = city_rankings(&aggregates);

        assert_eq!(rankings.highest_prices.len(), RANKING_SIZE);
        assert_eq!(rankings.highest_prices[0].source_city, "City7");
        assert_eq!(rankings.lowest_prices[0].source_city, "City1");
        assert_eq!(rankings.most_inventory[0].listing_count, 9);
        assert_eq!(rankings.most_inventory[4].source_city, "City5");
    }

    #[test]
    fn test_make_stats() {
        let stats = make_stats(&[
            record("Toyota", "Boston", 1000.0, Some(10_000.0)),
            record("Honda", "Boston", 2500.0, None),
            record("Toyota", "Miami", 2001.0, None),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].make, "Honda");
        assert_eq!(stats[0].avg_mileage, None);
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].avg_price, Some(1500.5));
        assert_eq!(stats[1].avg_mileage, Some(10_000.0));
    }
}
