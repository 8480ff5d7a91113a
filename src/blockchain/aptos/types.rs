//! Aptos REST API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::rest::{opt_u64_from_str_or_num, u64_from_str_or_num};
use crate::blockchain::types::{AnchorReference, AnchorStatus, NetworkId, RecordKind};

/// A Move entry-function call, in the REST API's JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Fully qualified function, e.g. `0x1::aptos_account::transfer`.
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl EntryFunctionPayload {
    pub fn new(function: impl Into<String>, arguments: Vec<serde_json::Value>) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// Unsigned transaction as accepted by `/transactions/encode_submission`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub sender: String,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: EntryFunctionPayload,
}

impl SubmitRequest {
    /// Attach an ed25519 signature over the encoded signing message.
    pub fn sign(self, public_key: &[u8; 32], signature: &[u8; 64]) -> SignedSubmitRequest {
        SignedSubmitRequest {
            request: self,
            signature: TransactionSignature {
                signature_type: "ed25519_signature".to_string(),
                public_key: format!("0x{}", hex::encode(public_key)),
                signature: format!("0x{}", hex::encode(signature)),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub signature_type: String,
    pub public_key: String,
    pub signature: String,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct SignedSubmitRequest {
    #[serde(flatten)]
    pub request: SubmitRequest,
    pub signature: TransactionSignature,
}

/// Subset of `GET /accounts/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub sequence_number: u64,
}

/// Response of `POST /transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

/// Subset of `GET /transactions/by_hash/{hash}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub hash: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
    #[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
    pub version: Option<u64>,
    #[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
    pub gas_used: Option<u64>,
    /// Commit time in microseconds since the epoch.
    #[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
    pub timestamp: Option<u64>,
}

impl TransactionRecord {
    pub fn is_pending(&self) -> bool {
        self.tx_type == "pending_transaction"
    }

    pub fn status(&self) -> AnchorStatus {
        match (self.is_pending(), self.success) {
            (true, _) | (false, None) => AnchorStatus::Pending,
            (false, Some(true)) => AnchorStatus::Success,
            (false, Some(false)) => AnchorStatus::Failed,
        }
    }

    /// Translate into the common reference shape.
    ///
    /// `fallback_submitter` is used when the record carries no sender.
    pub fn into_reference(self, fallback_submitter: &str, kind: Option<RecordKind>) -> AnchorReference {
        let status = self.status();
        let submitted_at = self
            .timestamp
            .and_then(|micros| DateTime::<Utc>::from_timestamp_micros(micros as i64))
            .unwrap_or_else(Utc::now);

        AnchorReference {
            id: self.hash,
            network: NetworkId::Primary,
            submitter: self.sender.unwrap_or_else(|| fallback_submitter.to_string()),
            submitted_at,
            status,
            block_height: self.version,
            cost: self.gas_used,
            kind,
            synthetic: false,
        }
    }
}
