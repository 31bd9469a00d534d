//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Source;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// CSS selectors for listing index pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Manufacturer and noise-word catalogs for field extraction
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Artifact storage location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Source cities, scraped in this order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<Source>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_concurrent == 0 {
            return Err(AppError::validation("scraper.max_concurrent must be > 0"));
        }
        if self.scraper.listing_cap == 0 {
            return Err(AppError::validation("scraper.listing_cap must be > 0"));
        }
        if !self.scraper.index_url_template.contains("{code}") {
            return Err(AppError::validation(
                "scraper.index_url_template must contain {code}",
            ));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut codes = HashSet::new();
        for source in &self.sources {
            if source.code.trim().is_empty() || source.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "source '{}' needs both a code and a name",
                    source.code
                )));
            }
            if !codes.insert(source.code.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source code '{}'",
                    source.code
                )));
            }
        }

        if self.extraction.makes.is_empty() {
            return Err(AppError::validation("extraction.makes is empty"));
        }
        if self.selectors.title_links.is_empty() {
            return Err(AppError::validation("selectors.title_links is empty"));
        }
        for selector in self.selectors.all() {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            selectors: SelectorConfig::default(),
            extraction: ExtractionConfig::default(),
            storage: StorageConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between source requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum sources scraped at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum listings taken from one source index
    #[serde(default = "defaults::listing_cap")]
    pub listing_cap: usize,

    /// Extra attempts after a transient fetch failure
    #[serde(default)]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff in milliseconds
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Index URL with a `{code}` placeholder for the source code
    #[serde(default = "defaults::index_url_template")]
    pub index_url_template: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            listing_cap: defaults::listing_cap(),
            max_retries: 0,
            retry_backoff_ms: defaults::retry_backoff(),
            index_url_template: defaults::index_url_template(),
        }
    }
}

/// CSS selectors for a source listing index.
///
/// Selector lists are tried in order; the first element found wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// One element per listing
    #[serde(default = "defaults::listing_selector")]
    pub listing: String,

    /// Anchor carrying the listing link
    #[serde(default = "defaults::title_link_selectors")]
    pub title_links: Vec<String>,

    /// Title element inside the anchor; anchor text is used when absent
    #[serde(default = "defaults::title_text_selector")]
    pub title_text: Option<String>,

    /// Structured price fields
    #[serde(default = "defaults::price_selectors")]
    pub price: Vec<String>,

    /// Structured location fields
    #[serde(default = "defaults::location_selectors")]
    pub location: Vec<String>,
}

impl SelectorConfig {
    fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.listing.as_str())
            .chain(self.title_links.iter().map(String::as_str))
            .chain(self.title_text.as_deref())
            .chain(self.price.iter().map(String::as_str))
            .chain(self.location.iter().map(String::as_str))
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: defaults::listing_selector(),
            title_links: defaults::title_link_selectors(),
            title_text: defaults::title_text_selector(),
            price: defaults::price_selectors(),
            location: defaults::location_selectors(),
        }
    }
}

/// Catalogs used by the field extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Manufacturer names, checked top-down; first match wins
    #[serde(default = "defaults::makes")]
    pub makes: Vec<String>,

    /// Words that end a model name
    #[serde(default = "defaults::noise_words")]
    pub noise_words: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            makes: defaults::makes(),
            noise_words: defaults::noise_words(),
        }
    }
}

/// Artifact storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding the bronze/silver/gold trees
    #[serde(default = "defaults::storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: defaults::storage_root(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use crate::models::Source;

    // Scraper defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn listing_cap() -> usize {
        100
    }
    pub fn retry_backoff() -> u64 {
        500
    }
    pub fn index_url_template() -> String {
        "https://{code}.craigslist.org/d/cars-trucks/search/cta".into()
    }

    // Selector defaults
    pub fn listing_selector() -> String {
        "li.cl-static-search-result".into()
    }
    pub fn title_link_selectors() -> Vec<String> {
        vec![
            "a[href*='/cto/']".into(),
            "a[href*='/ctd/']".into(),
            "a[href*='/ctp/']".into(),
            "a.cl-app-anchor".into(),
        ]
    }
    pub fn title_text_selector() -> Option<String> {
        Some("div.title".into())
    }
    pub fn price_selectors() -> Vec<String> {
        vec!["span.result-price".into(), "div.price".into()]
    }
    pub fn location_selectors() -> Vec<String> {
        vec!["span.result-hood".into(), "div.location".into()]
    }

    // Extraction catalogs
    pub fn makes() -> Vec<String> {
        [
            "Mercedes-Benz",
            "Land Rover",
            "Chevrolet",
            "Chevy",
            "Toyota",
            "Honda",
            "Ford",
            "BMW",
            "Audi",
            "Volkswagen",
            "VW",
            "Nissan",
            "Hyundai",
            "Kia",
            "Subaru",
            "Mazda",
            "Lexus",
            "Infiniti",
            "Acura",
            "Cadillac",
            "Buick",
            "GMC",
            "Jeep",
            "Dodge",
            "Chrysler",
            "Ram",
            "Lincoln",
            "Volvo",
            "Porsche",
            "Tesla",
            "Mitsubishi",
            "Suzuki",
            "Fiat",
            "Mini",
            "Jaguar",
            "Maserati",
            "Ferrari",
            "Lamborghini",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn noise_words() -> Vec<String> {
        [
            "Touring",
            "Low",
            "miles",
            "dvd",
            "Navi",
            "navigation",
            "backup",
            "camera",
            "owner",
            "since",
            "new",
            "original",
            "AMG",
            "4MATIC",
            "Coupe",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn storage_root() -> PathBuf {
        PathBuf::from("storage")
    }

    pub fn sources() -> Vec<Source> {
        [
            ("newyork", "New York, NY"),
            ("losangeles", "Los Angeles, CA"),
            ("chicago", "Chicago, IL"),
            ("houston", "Houston, TX"),
            ("philadelphia", "Philadelphia, PA"),
            ("phoenix", "Phoenix, AZ"),
            ("sanantonio", "San Antonio, TX"),
            ("sandiego", "San Diego, CA"),
            ("dallas", "Dallas, TX"),
            ("miami", "Miami, FL"),
            ("atlanta", "Atlanta, GA"),
            ("boston", "Boston, MA"),
            ("detroit", "Detroit, MI"),
            ("seattle", "Seattle, WA"),
            ("denver", "Denver, CO"),
            ("lasvegas", "Las Vegas, NV"),
            ("portland", "Portland, OR"),
            ("nashville", "Nashville, TN"),
            ("baltimore", "Baltimore, MD"),
            ("milwaukee", "Milwaukee, WI"),
            ("albuquerque", "Albuquerque, NM"),
            ("tucson", "Tucson, AZ"),
            ("fresno", "Fresno, CA"),
            ("sacramento", "Sacramento, CA"),
            ("kansascity", "Kansas City, MO"),
            ("mesa", "Mesa, AZ"),
            ("virginiabeach", "Virginia Beach, VA"),
            ("omaha", "Omaha, NE"),
            ("colorado", "Colorado Springs, CO"),
            ("raleigh", "Raleigh, NC"),
            ("longbeach", "Long Beach, CA"),
            ("minneapolis", "Minneapolis, MN"),
            ("cleveland", "Cleveland, OH"),
            ("wichita", "Wichita, KS"),
            ("arlington", "Arlington, TX"),
            ("bakersfield", "Bakersfield, CA"),
            ("neworleans", "New Orleans, LA"),
            ("honolulu", "Honolulu, HI"),
            ("anaheim", "Anaheim, CA"),
            ("tampa", "Tampa, FL"),
            ("aurora", "Aurora, CO"),
            ("santaana", "Santa Ana, CA"),
            ("stlouis", "St. Louis, MO"),
            ("riverside", "Riverside, CA"),
            ("corpuschristi", "Corpus Christi, TX"),
            ("lexington", "Lexington, KY"),
            ("pittsburgh", "Pittsburgh, PA"),
            ("anchorage", "Anchorage, AK"),
            ("stockton", "Stockton, CA"),
            ("cincinnati", "Cincinnati, OH"),
        ]
        .into_iter()
        .map(|(code, name)| Source::new(code, name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_catalog_has_fifty_sources() {
        assert_eq!(Config::default().sources.len(), 50);
    }

    #[test]
    fn default_policy_constants() {
        let config = Config::default();
        assert_eq!(config.scraper.listing_cap, 100);
        assert_eq!(config.scraper.request_delay_ms, 1000);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.scraper.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_source_codes() {
        let mut config = Config::default();
        config.sources.push(Source::new("chicago", "Chicago again"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.selectors.price.push("[[invalid".to_string());
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scraper]
            listing_cap = 25

            [[sources]]
            code = "omaha"
            name = "Omaha, NE"
            "#,
        )
        .unwrap();
        assert_eq!(config.scraper.listing_cap, 25);
        assert_eq!(config.scraper.request_delay_ms, 1000);
        assert_eq!(config.sources, vec![Source::new("omaha", "Omaha, NE")]);
        assert_eq!(config.extraction.makes[0], "Mercedes-Benz");
    }
}
