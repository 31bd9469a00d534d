// src/services/listings.rs

//! Listing scraper service.
//!
//! Fetches each source's listing index, extracts fields from every listing
//! and merges the per-source batches into one capture batch. A failing
//! source or listing is counted and skipped; it never aborts the run.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, ListingRecord, SelectorConfig, Source};
use crate::services::extract::{Extractor, dealer_type};
use crate::services::fetch::PageFetcher;
use crate::utils::{normalize_whitespace, resolve_url};

/// Listings extracted from one source.
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub records: Vec<ListingRecord>,
    /// Listings dropped because they could not be parsed
    pub skipped: usize,
}

/// A source that contributed nothing to the batch.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub code: String,
    pub name: String,
    pub error: String,
}

/// Summary of a scrape run.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<ListingRecord>,
    pub source_total: usize,
    pub source_failures: Vec<SourceFailure>,
    pub listings_skipped: usize,
}

/// Compiled index selectors.
struct IndexSelectors {
    listing: Selector,
    title_links: Vec<Selector>,
    title_text: Option<Selector>,
    price: Vec<Selector>,
    location: Vec<Selector>,
}

impl IndexSelectors {
    fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            listing: parse_selector(&config.listing)?,
            title_links: parse_selectors(&config.title_links)?,
            title_text: config.title_text.as_deref().map(parse_selector).transpose()?,
            price: parse_selectors(&config.price)?,
            location: parse_selectors(&config.location)?,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn parse_selectors(list: &[String]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

/// Text of the first element matched by any selector, in selector order.
fn first_text(element: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| element.select(sel).next())
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

/// Service for scraping listings from every configured source.
pub struct ListingScraper<F: PageFetcher> {
    config: Arc<Config>,
    extractor: Arc<Extractor>,
    fetcher: F,
    selectors: IndexSelectors,
}

impl<F: PageFetcher> ListingScraper<F> {
    /// Create a scraper. Fails if a configured selector does not parse.
    pub fn new(config: Arc<Config>, extractor: Arc<Extractor>, fetcher: F) -> Result<Self> {
        let selectors = IndexSelectors::compile(&config.selectors)?;
        Ok(Self {
            config,
            extractor,
            fetcher,
            selectors,
        })
    }

    /// Scrape every source, at most `max_concurrent` at a time.
    ///
    /// Batches are merged in source order once all workers are done, so
    /// the result does not depend on completion order.
    pub async fn scrape_all(&self, sources: &[Source], capture_date: NaiveDate) -> ScrapeOutcome {
        let concurrency = self.config.scraper.max_concurrent.max(1);
        let total = sources.len();

        let mut results: Vec<(usize, &Source, Result<SourceBatch>)> =
            stream::iter(sources.iter().enumerate())
                .map(|(index, source)| async move {
                    let result = self.scrape_source(source, capture_date).await;
                    match &result {
                        Ok(batch) => log::info!(
                            "[{}/{}] {}: {} listings",
                            index + 1,
                            total,
                            source.name,
                            batch.records.len()
                        ),
                        Err(error) => log::warn!(
                            "[{}/{}] {}: failed: {}",
                            index + 1,
                            total,
                            source.name,
                            error
                        ),
                    }
                    (index, source, result)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);

        let mut outcome = ScrapeOutcome {
            source_total: total,
            ..ScrapeOutcome::default()
        };
        for (_, source, result) in results {
            match result {
                Ok(batch) => {
                    outcome.listings_skipped += batch.skipped;
                    outcome.records.extend(batch.records);
                }
                Err(error) => outcome.source_failures.push(SourceFailure {
                    code: source.code.clone(),
                    name: source.name.clone(),
                    error: error.to_string(),
                }),
            }
        }
        outcome
    }

    /// Fetch and parse one source's listing index.
    pub async fn scrape_source(&self, source: &Source, capture_date: NaiveDate) -> Result<SourceBatch> {
        let url = source.index_url(&self.config.scraper.index_url_template);
        let base_url = Url::parse(&url)?;
        let html = self.fetcher.fetch(&url).await?;
        self.parse_index(&html, source, &base_url, capture_date)
    }

    /// Parse an index page into records, up to the listing cap.
    fn parse_index(
        &self,
        html: &str,
        source: &Source,
        base_url: &Url,
        capture_date: NaiveDate,
    ) -> Result<SourceBatch> {
        let document = Html::parse_document(html);
        let elements: Vec<ElementRef<'_>> = document.select(&self.selectors.listing).collect();
        if elements.is_empty() {
            return Err(AppError::parse(&source.name, "no listings found on index page"));
        }

        let mut batch = SourceBatch::default();
        for element in elements.into_iter().take(self.config.scraper.listing_cap) {
            match self.parse_listing(&element, source, base_url, capture_date) {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    batch.skipped += 1;
                    log::debug!("Skipping listing from {}: {}", source.name, error);
                }
            }
        }
        Ok(batch)
    }

    /// Build one record. Structured price/location fields win over the
    /// text heuristics.
    fn parse_listing(
        &self,
        element: &ElementRef<'_>,
        source: &Source,
        base_url: &Url,
        capture_date: NaiveDate,
    ) -> Result<ListingRecord> {
        let anchor = self
            .selectors
            .title_links
            .iter()
            .find_map(|sel| element.select(sel).next())
            .ok_or_else(|| AppError::parse(&source.name, "listing has no title link"))?;

        let title_element = self
            .selectors
            .title_text
            .as_ref()
            .and_then(|sel| anchor.select(sel).next())
            .unwrap_or(anchor);
        let title = normalize_whitespace(&title_element.text().collect::<String>());
        if title.is_empty() {
            return Err(AppError::parse(&source.name, "listing has an empty title"));
        }

        let href = anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| AppError::parse(&source.name, format!("no link for '{title}'")))?;
        let link = resolve_url(base_url, href);

        let full_text = element.text().collect::<Vec<_>>().join("\n");
        let fields = self.extractor.extract_title(&title);

        let price = first_text(element, &self.selectors.price)
            .unwrap_or_else(|| self.extractor.price_from_text(&full_text));
        let location = first_text(element, &self.selectors.location)
            .map(|text| text.replace(['(', ')'], "").trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.extractor.location_from_text(&full_text));

        Ok(ListingRecord {
            year: fields.year,
            make: fields.make,
            model: fields.model,
            title,
            price,
            mileage: fields.mileage,
            dealer_type: dealer_type(&link),
            location,
            link,
            source_city: source.name.clone(),
            capture_date,
        })
    }
}
