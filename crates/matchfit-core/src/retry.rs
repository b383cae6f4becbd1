//! ============================================================================
//! Retry Logic - Exponential Backoff for Provider Calls
//! ============================================================================
//! Wraps any async request with bounded retries:
//! - Every failure is retryable (network, status, malformed body)
//! - Delay doubles per attempt: base * 2^attempt, no jitter
//! - The last failure is returned once attempts are exhausted
//! ============================================================================

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay between attempts (multiplied by 2^attempt)
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Config that tries exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Delay to wait after the failed attempt with the given zero-based index
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt.min(63));
    Duration::from_millis(config.base_delay_ms.saturating_mul(multiplier))
}

/// Run `op` until it succeeds or `config.max_attempts` is reached.
///
/// The sleep between attempts is a tokio timer, so other tasks keep running.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded on attempt {}", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if attempt + 1 < attempts => {
                let delay = calculate_delay(attempt, config);
                warn!(
                    "{} attempt {}/{} failed: {} (retrying in {:?})",
                    label,
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{} failed after {} attempts: {}", label, attempts, e);
                return Err(e);
            }
        }
    }
}
