//! Retry with exponential backoff for provider calls.
//!
//! Only transport failures (see [`ProviderError::is_transient`]) are retried.
//! Permanent provider conditions are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::provider::ProviderError;

/// Run `operation` until it succeeds, fails permanently, or `config.max_attempts`
/// attempts have been made. The delay starts at `initial_delay_ms` and is
/// multiplied by `backoff_multiplier` after every failure, capped at
/// `max_delay_ms`.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = config.initial_delay();

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = operation_name, attempts = attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    operation = operation_name,
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;

                attempt += 1;
                delay = next_delay(delay, config);
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(operation = operation_name, error = %e, attempts = attempt, "Retry budget exhausted");
                } else {
                    tracing::debug!(operation = operation_name, error = %e, "Permanent failure, not retrying");
                }
                return Err(e);
            }
        }
    }
}

fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
    next.min(config.max_delay())
}
