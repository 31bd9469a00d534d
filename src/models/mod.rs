// src/models/mod.rs

//! Domain models for the scraper and refinement pipeline.
//!
//! Records flow one way: `ListingRecord` (capture) to `CleanedRecord`
//! (validated) to `CityAggregate` (per-city statistics).

mod cleaned;
mod config;
mod listing;
mod source;

// Re-export all public types
pub use cleaned::{CityAggregate, CleanedRecord};
pub use config::{Config, ExtractionConfig, ScraperConfig, SelectorConfig, StorageConfig};
pub use listing::{DealerType, ListingRecord, UNKNOWN, is_unknown};
pub use source::Source;
