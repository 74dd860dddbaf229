//! Bounded exponential backoff for rate-limited calls
//!
//! The policy wraps a single attempt. When the attempt fails with the
//! rate-limit signature ([`LlmError::is_rate_limited`]) and retries remain, it
//! waits and tries again, doubling the wait each time. Any other failure is
//! returned immediately and unchanged. There is no jitter and no cap on the
//! delay; the retry budget is expected to stay small.

use std::future::Future;
use std::time::Duration;

use bamboo_config::Config;
use tracing::{debug, warn};

use crate::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Wait before the first retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: bamboo_config::config::DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(
                bamboo_config::config::DEFAULT_INITIAL_DELAY_MS,
            ),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries(), config.initial_retry_delay())
    }

    /// Total attempts when every attempt is rate limited
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (0-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Waits the policy would apply if every attempt were rate limited
    #[must_use]
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|r| self.delay_for(r)).collect()
    }

    /// Run `attempt` until it succeeds, fails without the rate-limit
    /// signature, or the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last failure unchanged. A rate-limited error coming out of
    /// this function means all [`max_attempts`](Self::max_attempts) were used.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: &str,
        mut attempt: F,
    ) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut retry = 0u32;
        loop {
            debug!(operation = %operation, attempt = retry + 1, "Invoking generation service");
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    warn!(
                        operation = %operation,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        warn!(
                            operation = %operation,
                            attempts = retry + 1,
                            "Retry budget exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
