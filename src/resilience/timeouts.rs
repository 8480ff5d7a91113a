//! Timeout enforcement for chain calls.

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{ChainError, ChainResult};

/// Bound `fut` by `secs`, mapping expiry to [`ChainError::Timeout`].
pub async fn with_timeout<T, F>(secs: u64, fut: F) -> ChainResult<T>
where
    F: Future<Output = ChainResult<T>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout(secs)),
    }
}
