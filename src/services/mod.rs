//! Service layer for the scraper application.
//!
//! This module contains the business logic for:
//! - Field extraction from listing text (`Extractor`)
//! - Page fetching with pacing and retry (`HttpFetcher`, `RateLimitedFetcher`, `RetryingFetcher`)
//! - Per-source listing scraping (`ListingScraper`)
//! - Cleaning, aggregation and read-only report views

pub mod aggregate;
pub mod clean;
pub mod extract;
pub mod fetch;
pub mod listings;
pub mod report;

pub use aggregate::aggregate;
pub use clean::{CleanOutcome, clean};
pub use extract::{Extractor, TitleFields, dealer_type};
pub use fetch::{HttpFetcher, PageFetcher, RateLimitedFetcher, RetryingFetcher, http_fetcher};
pub use listings::{ListingScraper, ScrapeOutcome, SourceBatch, SourceFailure};
