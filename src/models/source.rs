//! Scrape source (one city endpoint).

use serde::{Deserialize, Serialize};

/// A city whose listing index is scraped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Subdomain code (e.g. "chicago")
    pub code: String,

    /// Display name stored as `source_city` (e.g. "Chicago, IL")
    pub name: String,
}

impl Source {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Build the index URL by substituting `{code}` in the template.
    pub fn index_url(&self, template: &str) -> String {
        template.replace("{code}", &self.code)
    }
}
