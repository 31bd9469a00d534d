//! Listing record captured from a source index page.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Sentinel stored in any text field the extractor could not resolve.
pub const UNKNOWN: &str = "unknown";

/// Returns `true` if the value is the unresolved sentinel.
pub fn is_unknown(value: &str) -> bool {
    value == UNKNOWN
}

/// Who is selling the vehicle, derived from the listing URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealerType {
    Owner,
    Dealer,
    Private,
}

impl DealerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealerType::Owner => "Owner",
            DealerType::Dealer => "Dealer",
            DealerType::Private => "Private",
        }
    }
}

impl fmt::Display for DealerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealerType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(DealerType::Owner),
            "dealer" => Ok(DealerType::Dealer),
            "private" => Ok(DealerType::Private),
            other => Err(AppError::validation(format!("unknown dealer type '{other}'"))),
        }
    }
}

/// One scraped listing. Immutable once captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    /// Four digit model year or `unknown`
    pub year: String,

    /// Manufacturer as spelled in the catalog, or `unknown`
    pub make: String,

    /// Up to three words following the make, or `unknown`
    pub model: String,

    /// Raw listing title
    pub title: String,

    /// Raw price text (e.g. `$5,500`) or `unknown`
    pub price: String,

    /// Raw mileage text (e.g. `45k`, `120,000`) or `unknown`
    pub mileage: String,

    pub dealer_type: DealerType,

    /// Free-text neighbourhood or `unknown`
    pub location: String,

    /// Absolute listing URL; natural key
    pub link: String,

    /// Display name of the source city
    pub source_city: String,

    /// Date the scrape ran
    pub capture_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dealer_type_round_trip_through_text() {
        for dealer in [DealerType::Owner, DealerType::Dealer, DealerType::Private] {
            assert_eq!(dealer.as_str().parse::<DealerType>().unwrap(), dealer);
        }
        assert_eq!(" owner ".parse::<DealerType>().unwrap(), DealerType::Owner);
        assert!("broker".parse::<DealerType>().is_err());
    }

    #[test]
    fn test_is_unknown() {
        assert!(is_unknown(UNKNOWN));
        assert!(!is_unknown("2015"));
    }
}
