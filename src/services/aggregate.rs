// src/services/aggregate.rs

//! City-level statistics over cleaned listings.

use std::collections::BTreeMap;

use crate::models::{CityAggregate, CleanedRecord};

/// Round to two decimal places, ties to even, as persisted.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median, averaging the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Model year as an integer, tolerating legacy `2015.0` spellings.
fn year_value(year: &str) -> Option<f64> {
    year.trim().parse::<f64>().ok().map(f64::trunc)
}

#[derive(Default)]
struct CityGroup {
    count: u64,
    prices: Vec<f64>,
    mileages: Vec<f64>,
    years: Vec<f64>,
}

/// One row per city present in `records`, ordered by city name.
pub fn aggregate(records: &[CleanedRecord]) -> Vec<CityAggregate> {
    let mut groups: BTreeMap<&str, CityGroup> = BTreeMap::new();

    for record in records {
        let group = groups.entry(record.listing.source_city.as_str()).or_default();
        group.count += 1;
        group.prices.extend(record.price_value);
        group.mileages.extend(record.mileage_value);
        group.years.extend(year_value(&record.listing.year));
    }

    groups
        .into_iter()
        .map(|(city, group)| CityAggregate {
            source_city: city.to_string(),
            avg_price: mean(&group.prices).map(round2).unwrap_or_default(),
            median_price: median(&group.prices).map(round2).unwrap_or_default(),
            listing_count: group.count,
            avg_mileage: mean(&group.mileages).map(round2),
            avg_year: mean(&group.years).map(round2).unwrap_or_default(),
        })
        .collect()
}
