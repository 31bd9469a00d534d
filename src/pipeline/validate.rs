// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::Extractor;

/// Validate configuration, including that every pattern compiles.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    Extractor::new(&config.extraction)?;

    log::info!("    User agent: {}", config.scraper.user_agent);
    log::info!("    Timeout: {}s", config.scraper.timeout_secs);
    log::info!("    Request delay: {}ms", config.scraper.request_delay_ms);
    log::info!("    Max concurrent: {}", config.scraper.max_concurrent);
    log::info!("    Listing cap: {}", config.scraper.listing_cap);
    log::info!("    Sources: {}", config.sources.len());
    log::info!("    Makes: {}", config.extraction.makes.len());
    log::info!("Config OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(run_validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_noise_words_are_literal() {
        let mut config = Config::default();
        config.extraction.noise_words.push("(".to_string());
        assert!(run_validate(&config).is_ok());
    }

    #[test]
    fn test_zero_listing_cap_fails() {
        let mut config = Config::default();
        config.scraper.listing_cap = 0;
        assert!(run_validate(&config).is_err());
    }
}
