// src/services/fetch.rs

//! Page fetching behind a trait so the scraper can be driven without a
//! network.
//!
//! The production stack is `RetryingFetcher<RateLimitedFetcher<HttpFetcher>>`:
//! every attempt, retries included, takes a token from the shared bucket.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;

use crate::error::Result;
use crate::models::ScraperConfig;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::retry::retry_with_backoff;

/// Something that can return the body of a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Single-attempt reqwest fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        fetch_text(&self.client, url).await
    }
}

/// Wraps a fetcher so requests start at least `period` apart.
///
/// The bucket is shared by every worker, so running sources in parallel
/// does not raise the request rate above the sequential pacing.
pub struct RateLimitedFetcher<F: PageFetcher> {
    inner: F,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<F: PageFetcher> RateLimitedFetcher<F> {
    /// A zero period disables pacing.
    pub fn new(inner: F, period: Duration) -> Self {
        let limiter = Quota::with_period(period)
            .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))));
        Self { inner, limiter }
    }

    pub fn from_config(inner: F, config: &ScraperConfig) -> Self {
        Self::new(inner, Duration::from_millis(config.request_delay_ms))
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.inner.fetch(url).await
    }
}

/// Retries transient failures of the wrapped fetcher with exponential backoff.
pub struct RetryingFetcher<F: PageFetcher> {
    inner: F,
    max_retries: u32,
    backoff_ms: u64,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_ms,
        }
    }

    pub fn from_config(inner: F, config: &ScraperConfig) -> Self {
        Self::new(inner, config.max_retries, config.retry_backoff_ms)
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for RetryingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String> {
        retry_with_backoff(self.max_retries, self.backoff_ms, || self.inner.fetch(url)).await
    }
}

/// The fetcher used for live runs: paced, with retries outside the pacing.
pub fn http_fetcher(config: &ScraperConfig) -> Result<RetryingFetcher<RateLimitedFetcher<HttpFetcher>>> {
    let paced = RateLimitedFetcher::from_config(HttpFetcher::new(config)?, config);
    Ok(RetryingFetcher::from_config(paced, config))
}
