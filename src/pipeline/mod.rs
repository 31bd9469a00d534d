//! Pipeline entry points for scheduled and operational runs.
//!
//! - `run_scraper`: Capture listings from every source (one artifact per run)
//! - `run_refinement`: Clean all captures and aggregate by city
//! - `run_pipeline`: Both of the above, in order
//! - `run_ingest`: Import legacy CSV captures
//! - `run_report`, `run_info`, `run_validate`: Read-only operations

pub mod info;
pub mod ingest;
pub mod load;
pub mod pipeline;
pub mod refine;
pub mod report;
pub mod scrape;
pub mod validate;

pub use info::{PartitionInfo, run_info};
pub use ingest::{IngestSummary, run_ingest};
pub use load::load_captures;
pub use pipeline::run_pipeline;
pub use refine::{RefineSummary, run_refinement};
pub use report::{Report, run_report};
pub use scrape::{STATS_FILE, ScrapeStats, ScrapeSummary, run_scraper, scrape_with};
pub use validate::run_validate;
