//! Cleaned listing and city aggregate rows.

use serde::{Deserialize, Serialize};

use super::ListingRecord;

/// A listing that passed cleaning, with parsed numeric fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanedRecord {
    #[serde(flatten)]
    pub listing: ListingRecord,

    /// Parsed `price`, currency symbols and separators stripped
    pub price_value: Option<f64>,

    /// Parsed `mileage`, `k` suffix expanded
    pub mileage_value: Option<f64>,
}

impl CleanedRecord {
    pub fn link(&self) -> &str {
        &self.listing.link
    }
}

/// Summary statistics for one source city.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityAggregate {
    pub source_city: String,
    pub avg_price: f64,
    pub median_price: f64,
    pub listing_count: u64,
    /// `None` when no listing in the city had a parseable mileage
    pub avg_mileage: Option<f64>,
    pub avg_year: f64,
}
