// src/services/clean.rs

//! Cleaning and validation of captured listings.
//!
//! Numeric fields are parsed, duplicates by `link` are dropped keeping the
//! first occurrence in input order, and low-confidence rows are filtered.
//! Rejections are data, not errors.

use std::collections::HashSet;

use crate::models::{CleanedRecord, ListingRecord, is_unknown};

/// Prices at or below this are treated as placeholders.
pub const MIN_PRICE: f64 = 500.0;

/// Cleaned rows plus counts of what was dropped.
#[derive(Debug, Default)]
pub struct CleanOutcome {
    pub records: Vec<CleanedRecord>,
    /// Rows dropped because an earlier row had the same link
    pub duplicates: usize,
    /// Rows dropped by the year/make/price filter
    pub rejected: usize,
}

/// Parse price text such as `$5,500`.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    parse_number(&stripped)
}

/// Parse mileage text such as `45k` or `120,000`.
pub fn parse_mileage(text: &str) -> Option<f64> {
    let stripped = text.replace(',', "").trim().to_lowercase();
    match stripped.strip_suffix('k') {
        Some(thousands) => parse_number(thousands).map(|v| v * 1000.0),
        None => parse_number(&stripped),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a cleaned row may appear in the cleaned dataset.
pub fn is_valid(record: &CleanedRecord) -> bool {
    !is_unknown(&record.listing.year)
        && !is_unknown(&record.listing.make)
        && record.price_value.is_some_and(|p| p > MIN_PRICE)
}

/// Attach parsed numeric fields to a captured row.
pub fn parse_record(listing: ListingRecord) -> CleanedRecord {
    let price_value = parse_price(&listing.price);
    let mileage_value = parse_mileage(&listing.mileage);
    CleanedRecord {
        listing,
        price_value,
        mileage_value,
    }
}

/// Clean a capture batch, or the union of several in loader order.
pub fn clean(listings: impl IntoIterator<Item = ListingRecord>) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for listing in listings {
        if !seen.insert(listing.link.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        let record = parse_record(listing);
        if is_valid(&record) {
            outcome.records.push(record);
        } else {
            outcome.rejected += 1;
        }
    }

    log::info!(
        "Cleaned {} rows ({} duplicates, {} rejected)",
        outcome.records.len(),
        outcome.duplicates,
        outcome.rejected
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealerType, UNKNOWN};
    use chrono::NaiveDate;

    fn listing(link: &str, price: &str) -> ListingRecord {
        ListingRecord {
            year: "2014".to_string(),
            make: "Ford".to_string(),
            model: "Focus".to_string(),
            title: "2014 Ford Focus".to_string(),
            price: price.to_string(),
            mileage: "88k".to_string(),
            dealer_type: DealerType::Private,
            location: UNKNOWN.to_string(),
            link: link.to_string(),
            source_city: "Austin".to_string(),
            capture_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$5,500"), Some(5500.0));
        assert_eq!(parse_price(" $12 "), Some(12.0));
        assert_eq!(parse_price(UNKNOWN), None);
        assert_eq!(parse_price("$"), None);
    }

    #[test]
    fn test_parse_mileage() {
        assert_eq!(parse_mileage("45k"), Some(45_000.0));
        assert_eq!(parse_mileage("45K"), Some(45_000.0));
        assert_eq!(parse_mileage("120,000"), Some(120_000.0));
        assert_eq!(parse_mileage("98000"), Some(98_000.0));
        assert_eq!(parse_mileage(UNKNOWN), None);
    }

    #[test]
    fn test_price_boundary() {
        let outcome = clean(vec![listing("https://a/1", "$500"), listing("https://a/2", "$501")]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].link(), "https://a/2");
        assert_eq!(outcome.records[0].price_value, Some(501.0));
        assert_eq!(outcome.rejected, 1);
    }

    #[test]
    fn test_unknown_year_make_or_price_rejected() {
        let mut no_year = listing("https://a/1", "$900");
        no_year.year = UNKNOWN.to_string();
        let mut no_make = listing("https://a/2", "$900");
        no_make.make = UNKNOWN.to_string();
        let no_price = listing("https://a/3", UNKNOWN);

        let outcome = clean(vec![no_year, no_make, no_price]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.rejected, 3);
    }

    #[test]
    fn test_duplicate_keeps_first_seen() {
        let first = listing("https://a/1", "$2,000");
        let second = listing("https://a/1", "$3,000");

        for _ in 0..3 {
            let outcome = clean(vec![first.clone(), second.clone()]);
            assert_eq!(outcome.records.len(), 1);
            assert_eq!(outcome.records[0].price_value, Some(2000.0));
            assert_eq!(outcome.duplicates, 1);
        }
    }

    #[test]
    fn test_rejected_row_still_claims_its_link() {
        // the first occurrence wins even when it fails the filter
        let outcome = clean(vec![listing("https://a/1", "$100"), listing("https://a/1", "$9,000")]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.rejected, 1);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let input = vec![
            listing("https://a/1", "$1,200"),
            listing("https://a/1", "$1,300"),
            listing("https://a/2", "$450"),
            listing("https://a/3", "$7,000"),
        ];
        let once = clean(input).records;
        let twice = clean(once.iter().map(|r| r.listing.clone())).records;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_invariants() {
        let input: Vec<ListingRecord> = (0..40)
            .map(|i| listing(&format!("https://a/{}", i % 13), &format!("${}", 300 + i * 25)))
            .collect();
        let records = clean(input).records;

        let links: HashSet<&str> = records.iter().map(|r| r.link()).collect();
        assert_eq!(links.len(), records.len());
        assert!(records.iter().all(is_valid));
    }
}
