//! Wallet adapter boundary and key loading.
//!
//! # Security
//! - Signing keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//! - Adapters expose addresses, never key material

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use thiserror::Error;

use crate::blockchain::aptos::types::EntryFunctionPayload;
use crate::blockchain::types::ChainError;

/// Environment variable holding the primary-chain signing seed (hex).
pub const PRIMARY_KEY_ENV_VAR: &str = "REVIEW_ANCHOR_PRIMARY_KEY";

/// Environment variable holding the secondary-chain signing seed (hex).
pub const SECONDARY_KEY_ENV_VAR: &str = "REVIEW_ANCHOR_SECONDARY_KEY";

/// Errors surfaced by wallet adapters.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,

    /// The holder declined, or the chain refused the signed transaction.
    #[error("wallet request rejected: {0}")]
    Rejected(String),

    /// The adapter could not reach its backend.
    #[error("wallet backend unreachable: {0}")]
    Unreachable(String),

    #[error("{0} is not supported by this wallet")]
    Unsupported(&'static str),

    /// Invalid or missing key material.
    #[error("key error: {0}")]
    Key(String),
}

impl WalletError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, WalletError::Unreachable(_))
    }
}

impl From<ChainError> for WalletError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Wallet(inner) => inner,
            e if e.is_unreachable() => WalletError::Unreachable(e.to_string()),
            e => WalletError::Rejected(e.to_string()),
        }
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Capability set of a user-controlled key holder.
///
/// Implementations are selected per network; nothing here assumes a vendor.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Human-readable wallet name.
    fn label(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Address of the connected account, `None` while disconnected.
    fn address(&self) -> Option<String>;

    /// Perform the connection handshake and return the account address.
    async fn connect(&self) -> WalletResult<String>;

    async fn disconnect(&self) -> WalletResult<()>;

    /// Sign a primary-chain entry-function payload and submit it.
    ///
    /// Returns the transaction hash assigned by the chain.
    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> WalletResult<String>;
}

/// Parse a hex-encoded 32-byte ed25519 seed (with or without 0x prefix).
pub fn signing_key_from_hex(seed_hex: &str) -> WalletResult<SigningKey> {
    let seed_hex = seed_hex.trim();
    let seed_hex = seed_hex.strip_prefix("0x").unwrap_or(seed_hex);

    let bytes = hex::decode(seed_hex)
        .map_err(|e| WalletError::Key(format!("Invalid private key format: {}", e)))?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        WalletError::Key(format!(
            "Invalid private key length: expected 32 bytes, got {}",
            bytes.len()
        ))
    })?;

    Ok(SigningKey::from_bytes(&seed))
}

/// Load a signing key from the named environment variable.
///
/// Returns `Ok(None)` when the variable is unset.
pub fn signing_key_from_env(var: &str) -> WalletResult<Option<SigningKey>> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => signing_key_from_hex(&value).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";

    #[test]
    fn test_key_with_and_without_prefix() {
        let a = signing_key_from_hex(TEST_SEED).unwrap();
        let b = signing_key_from_hex(&format!("0x{}", TEST_SEED)).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_invalid_key() {
        let result = signing_key_from_hex("invalid_key");
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));

        let result = signing_key_from_hex("abcd");
        assert!(result.unwrap_err().to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn test_chain_error_conversion() {
        let err: WalletError = ChainError::Timeout(5).into();
        assert!(err.is_unreachable());

        let err: WalletError = ChainError::Rejected("SEQUENCE_NUMBER_TOO_OLD".into()).into();
        assert!(matches!(err, WalletError::Rejected(_)));

        let err: WalletError = ChainError::Wallet(WalletError::NotConnected).into();
        assert!(matches!(err, WalletError::NotConnected));
    }
}
