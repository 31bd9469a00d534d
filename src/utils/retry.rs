// src/utils/retry.rs

//! Bounded retry with exponential backoff for transient fetch errors.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Run `operation`, retrying transient failures up to `max_retries` times.
///
/// The wait before retry `n` (0-based) is `backoff_base_ms * 2^n`.
/// Non-transient errors (see [`AppError::is_transient`]) are returned
/// on the first occurrence.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        let err: AppError = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(32));
        log::warn!(
            "Transient error (attempt {}/{}), retrying in {}ms: {}",
            attempt + 1,
            max_retries + 1,
            delay_ms,
            err
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
