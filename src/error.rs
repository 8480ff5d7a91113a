//! Caller-facing error type.

use serde::Serialize;
use thiserror::Error;

use crate::blockchain::types::ChainError;
use crate::blockchain::wallet::WalletError;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AnchorError {
    #[error("network clients are not initialized")]
    NotInitialized,

    #[error("no wallet is connected")]
    NotConnected,

    #[error("wallet connection failed: {0}")]
    ConnectionFailed(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

pub type AnchorResult<T> = Result<T, AnchorError>;

impl AnchorError {
    /// Classify a failure raised while anchoring a record.
    pub fn submission(err: ChainError) -> Self {
        match err {
            ChainError::Wallet(WalletError::NotConnected) => AnchorError::NotConnected,
            e if e.is_unreachable() => AnchorError::NetworkUnreachable(e.to_string()),
            e => AnchorError::SubmissionRejected(e.to_string()),
        }
    }

    /// Classify a failure raised while reading a reference.
    pub fn lookup(err: ChainError) -> Self {
        AnchorError::LookupFailed(err.to_string())
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            AnchorError::NotInitialized => "not_initialized",
            AnchorError::NotConnected => "not_connected",
            AnchorError::ConnectionFailed(_) => "connection_failed",
            AnchorError::SubmissionRejected(_) => "submission_rejected",
            AnchorError::NetworkUnreachable(_) => "network_unreachable",
            AnchorError::LookupFailed(_) => "lookup_failed",
        }
    }
}
