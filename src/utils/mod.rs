//! Utility functions and helpers.

pub mod http;
pub mod retry;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://chicago.craigslist.org/d/cars-trucks/search/cta").unwrap();
        assert_eq!(
            resolve_url(&base, "/cto/d/chicago-2015-toyota/7712.html"),
            "https://chicago.craigslist.org/cto/d/chicago-2015-toyota/7712.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  2015\n Toyota \t Camry "), "2015 Toyota Camry");
    }
}
