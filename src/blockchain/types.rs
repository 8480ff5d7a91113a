//! Chain-agnostic types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::wallet::WalletError;

/// Which ledger an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// Smart-contract chain (Aptos).
    #[default]
    Primary,
    /// Ledger chain (Stellar).
    Secondary,
}

impl NetworkId {
    /// Every supported network, in lookup order.
    pub const ALL: [NetworkId; 2] = [NetworkId::Primary, NetworkId::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Primary => "primary",
            NetworkId::Secondary => "secondary",
        }
    }

    /// Name of the underlying chain.
    pub fn chain_name(&self) -> &'static str {
        match self {
            NetworkId::Primary => "aptos",
            NetworkId::Secondary => "stellar",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a network name is not recognized.
#[derive(Debug, Error)]
#[error("unknown network '{0}' (expected primary/aptos or secondary/stellar)")]
pub struct UnknownNetwork(pub String);

impl FromStr for NetworkId {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "aptos" => Ok(NetworkId::Primary),
            "secondary" | "stellar" => Ok(NetworkId::Secondary),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Purpose tag attached to an anchored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A legal review or opinion.
    Review,
    /// A continuing legal education record.
    Cle,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Review => "review",
            RecordKind::Cle => "cle",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "review" => Ok(RecordKind::Review),
            "cle" => Ok(RecordKind::Cle),
            other => Err(format!("unknown record kind '{}'", other)),
        }
    }
}

/// Outcome of an anchoring transaction as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorStatus {
    Pending,
    Success,
    Failed,
}

/// Durable, chain-specific reference produced by anchoring content.
///
/// Only `status`, `block_height` and `cost` change after creation, and only
/// through [`AnchorReference::refine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorReference {
    /// Transaction identifier on the owning network.
    pub id: String,
    pub network: NetworkId,
    /// Address of the session that submitted the record.
    #[serde(alias = "sender")]
    pub submitter: String,
    pub submitted_at: DateTime<Utc>,
    pub status: AnchorStatus,
    /// Block height (or ledger version) once known.
    pub block_height: Option<u64>,
    /// Gas or fee units spent once known.
    pub cost: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    /// Set when the data was reconstructed rather than read from a chain.
    #[serde(default)]
    pub synthetic: bool,
}

impl AnchorReference {
    /// A freshly submitted reference with nothing observed yet.
    pub fn pending(
        id: impl Into<String>,
        network: NetworkId,
        submitter: impl Into<String>,
        kind: Option<RecordKind>,
    ) -> Self {
        Self {
            id: id.into(),
            network,
            submitter: submitter.into(),
            submitted_at: Utc::now(),
            status: AnchorStatus::Pending,
            block_height: None,
            cost: None,
            kind,
            synthetic: false,
        }
    }

    /// Apply a more authoritative observation of the same transaction.
    pub fn refine(&mut self, observed: &AnchorReference) {
        self.status = observed.status;
        if observed.block_height.is_some() {
            self.block_height = observed.block_height;
        }
        if observed.cost.is_some() {
            self.cost = observed.cost;
        }
        self.synthetic = observed.synthetic;
    }
}

/// Errors raised by network backends and their clients.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Endpoint could not be reached or returned a server error.
    #[error("transport error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Endpoint reachable but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The requested transaction or account does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client handle for this network is unavailable.
    #[error("{network} client not ready: {reason}")]
    NotReady { network: NetworkId, reason: String },

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl ChainError {
    /// True when the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            ChainError::Transport(_) | ChainError::Timeout(_) | ChainError::NotReady { .. } => {
                true
            }
            ChainError::Wallet(e) => e.is_unreachable(),
            _ => false,
        }
    }

    /// True when repeating an idempotent read may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Transport(_) | ChainError::Timeout(_))
    }
}

/// Result type for backend operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing_accepts_chain_names() {
        assert_eq!("aptos".parse::<NetworkId>().unwrap(), NetworkId::Primary);
        assert_eq!("Stellar".parse::<NetworkId>().unwrap(), NetworkId::Secondary);
        assert_eq!("secondary".parse::<NetworkId>().unwrap(), NetworkId::Secondary);
        assert!("ethereum".parse::<NetworkId>().is_err());
    }

    #[test]
    fn test_refine_keeps_identity() {
        let mut reference =
            AnchorReference::pending("0xabc", NetworkId::Primary, "0x1", Some(RecordKind::Review));
        let mut observed = reference.clone();
        observed.submitter = "0x2".into();
        observed.status = AnchorStatus::Success;
        observed.block_height = Some(42);

        reference.refine(&observed);
        assert_eq!(reference.status, AnchorStatus::Success);
        assert_eq!(reference.block_height, Some(42));
        assert_eq!(reference.cost, None);
        assert_eq!(reference.submitter, "0x1");
    }

    #[test]
    fn test_sender_alias() {
        let json = r#"{"id":"ab","network":"secondary","sender":"GABC","submitted_at":"2024-01-01T00:00:00Z","status":"success","block_height":null,"cost":100}"#;
        let reference: AnchorReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.submitter, "GABC");
        assert_eq!(reference.cost, Some(100));
        assert!(!reference.synthetic);
    }

    #[test]
    fn test_error_classification() {
        assert!(ChainError::Timeout(10).is_unreachable());
        assert!(ChainError::Timeout(10).is_retryable());
        assert!(!ChainError::Rejected("abort".into()).is_unreachable());
        assert!(!ChainError::NotFound("0x1".into()).is_retryable());
        assert_eq!(ChainError::Timeout(10).to_string(), "RPC timeout after 10 seconds");
    }
}
