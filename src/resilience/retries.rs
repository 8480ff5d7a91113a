//! Retry logic for read-only chain queries.
//!
//! Only reads go through here; a submission is never repeated since a
//! duplicate would anchor the record twice. Only transport failures and
//! timeouts are retried.

use std::future::Future;

use crate::blockchain::types::ChainResult;
use crate::config::schema::RetryConfig;
use crate::resilience::backoff::backoff_for;

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn retry_read<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> ChainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let max_attempts = if config.enabled { config.max_attempts.max(1) } else { 1 };
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = backoff_for(config, attempt);
                tracing::debug!(
                    operation = %what,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying read"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
