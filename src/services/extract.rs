// src/services/extract.rs

//! Field extraction from listing titles and body text.
//!
//! Every extractor is total: a field that cannot be resolved becomes
//! [`UNKNOWN`]. Pattern tables are evaluated top to bottom and the first
//! match wins.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{DealerType, ExtractionConfig, UNKNOWN};

/// Mileage patterns in priority order: `45k`, `120,000 miles`, `98000 mi`.
const MILEAGE_PATTERNS: [&str; 3] = [
    r"(?i)(\d{1,3}k)\s*(?:miles?|mi)?",
    r"(?i)(\d{1,3},\d{3})\s*(?:original\s+)?(?:miles?|mi)",
    r"(?i)(\d{4,6})\s*(?:original\s+)?(?:miles?|mi)",
];

const YEAR_PATTERN: &str = r"\b(?:19|20)\d{2}\b";
const PRICE_PATTERN: &str = r"\$[\d,]+";

/// Fields derived from a listing title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFields {
    pub year: String,
    pub make: String,
    pub model: String,
    pub mileage: String,
}

/// One catalog entry with its compiled patterns.
#[derive(Debug)]
struct MakePattern {
    name: String,
    word: Regex,
    model: Regex,
}

impl MakePattern {
    fn compile(name: &str) -> Result<Self> {
        let escaped = regex::escape(name);
        Ok(Self {
            name: name.to_string(),
            word: compile(&format!(r"(?i)\b{escaped}\b"))?,
            model: compile(&format!(
                r"(?i)\b{escaped}\s+([A-Za-z0-9-]+(?:\s+[A-Za-z0-9-]+){{0,2}})"
            ))?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::config(format!("bad pattern {pattern}: {e}")))
}

/// Compiled extraction tables, built once from the catalog.
#[derive(Debug)]
pub struct Extractor {
    makes: Vec<MakePattern>,
    noise: Option<Regex>,
    mileage: Vec<Regex>,
    year: Regex,
    price: Regex,
}

impl Extractor {
    /// Compile the catalog. Catalog entries are matched literally.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let makes = config
            .makes
            .iter()
            .map(|name| MakePattern::compile(name))
            .collect::<Result<Vec<_>>>()?;

        let noise = if config.noise_words.is_empty() {
            None
        } else {
            let words: Vec<String> = config.noise_words.iter().map(|w| regex::escape(w)).collect();
            Some(compile(&format!(r"(?i)\s+(?:{})", words.join("|")))?)
        };

        Ok(Self {
            makes,
            noise,
            mileage: MILEAGE_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>>>()?,
            year: compile(YEAR_PATTERN)?,
            price: compile(PRICE_PATTERN)?,
        })
    }

    /// Extract year, make, model and mileage from a title.
    pub fn extract_title(&self, title: &str) -> TitleFields {
        let (make, model) = self.make_and_model(title);
        TitleFields {
            year: self.year(title),
            make,
            model,
            mileage: self.mileage(title),
        }
    }

    /// First `19xx`/`20xx` token.
    pub fn year(&self, title: &str) -> String {
        self.year
            .find(title)
            .map_or_else(|| UNKNOWN.to_string(), |m| m.as_str().to_string())
    }

    /// Catalog make and the words after it.
    ///
    /// The model is only looked for once a make matched. It keeps at most
    /// three words and is cut at the first noise word.
    pub fn make_and_model(&self, title: &str) -> (String, String) {
        let Some(make) = self.makes.iter().find(|m| m.word.is_match(title)) else {
            return (UNKNOWN.to_string(), UNKNOWN.to_string());
        };

        let model = make
            .model
            .captures(title)
            .and_then(|caps| caps.get(1))
            .map(|m| self.strip_noise(m.as_str()))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        (make.name.clone(), model)
    }

    fn strip_noise(&self, model: &str) -> String {
        let model = model.trim();
        let cut = self
            .noise
            .as_ref()
            .and_then(|noise| noise.find(model))
            .map_or(model, |m| &model[..m.start()]);
        cut.trim().to_string()
    }

    /// Raw mileage text from the first matching pattern.
    pub fn mileage(&self, title: &str) -> String {
        self.mileage
            .iter()
            .find_map(|pattern| pattern.captures(title).and_then(|c| c.get(1)))
            .map_or_else(|| UNKNOWN.to_string(), |m| m.as_str().to_string())
    }

    /// First `$` amount in the text that parses as a number.
    pub fn price_from_text(&self, text: &str) -> String {
        self.price
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|raw| raw.replace(['$', ','], "").parse::<f64>().is_ok())
            .map_or_else(|| UNKNOWN.to_string(), str::to_string)
    }

    /// The first substantive line after a line carrying a price.
    pub fn location_from_text(&self, text: &str) -> String {
        let mut found_price = false;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if found_price && !line.contains('$') && line.chars().count() > 2 {
                return line.to_string();
            }
            if line.contains('$') && self.price.is_match(line) {
                found_price = true;
            }
        }
        UNKNOWN.to_string()
    }
}

/// Classify the seller from the listing URL path.
pub fn dealer_type(link: &str) -> DealerType {
    if link.contains("/cto/") {
        DealerType::Owner
    } else if link.contains("/ctd/") {
        DealerType::Dealer
    } else {
        DealerType::Private
    }
}
