//! Primary-chain anchoring backend.
//!
//! # Submission path
//! ```text
//! registry configured?
//!     yes → <registry>::<module>::<function>(kind, sha3_256(content))
//!             committed with success      → done
//!             rejected / failed on chain  → liveness transfer
//!     no  → liveness transfer
//!
//! liveness transfer: 0x1::aptos_account::transfer(submitter, 0)
//! ```
//! A transaction still pending at the confirmation deadline is returned as
//! a `Pending` reference.

use async_trait::async_trait;
use serde_json::json;
use sha3::{Digest, Sha3_256};
use std::sync::Arc;
use tokio::time::timeout;
use std::time::Duration;

use crate::blockchain::aptos::is_transaction_hash;
use crate::blockchain::aptos::transaction::TxBuilder;
use crate::blockchain::aptos::types::EntryFunctionPayload;
use crate::blockchain::backend::NetworkBackend;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::types::{
    AnchorReference, AnchorStatus, ChainError, ChainResult, NetworkId, RecordKind,
};
use crate::blockchain::wallet::WalletAdapter;
use crate::config::schema::PrimaryChainConfig;

/// Function used when no registry is available.
pub const LIVENESS_FUNCTION: &str = "0x1::aptos_account::transfer";

pub struct AptosBackend {
    pool: Arc<ClientPool>,
    config: PrimaryChainConfig,
}

impl AptosBackend {
    pub fn new(pool: Arc<ClientPool>, config: PrimaryChainConfig) -> Self {
        Self { pool, config }
    }

    /// Registry call for `content`, if a registry is configured.
    pub fn registry_payload(&self, kind: RecordKind, content: &[u8]) -> Option<EntryFunctionPayload> {
        let registry = self.config.registry_address.as_deref()?;
        let digest = Sha3_256::digest(content);
        let function = format!(
            "{}::{}::{}",
            registry, self.config.registry_module, self.config.registry_function
        );
        Some(EntryFunctionPayload::new(
            function,
            vec![json!(kind.as_str()), json!(format!("0x{}", hex::encode(digest)))],
        ))
    }

    /// Zero-value self transfer; valid for any funded account.
    pub fn liveness_payload(submitter: &str) -> EntryFunctionPayload {
        EntryFunctionPayload::new(LIVENESS_FUNCTION, vec![json!(submitter), json!("0")])
    }

    async fn submit_and_confirm(
        &self,
        wallet: &dyn WalletAdapter,
        payload: &EntryFunctionPayload,
        submitter: &str,
        kind: RecordKind,
    ) -> ChainResult<AnchorReference> {
        let submit_timeout = self.config.submit_timeout_secs;
        let hash = timeout(Duration::from_secs(submit_timeout), wallet.sign_and_submit(payload))
            .await
            .map_err(|_| ChainError::Timeout(submit_timeout))??;

        let client = self.pool.aptos()?;
        let committed = TxBuilder::new(&client)
            .wait_for_confirmation(&hash, self.config.confirmation_timeout_secs)
            .await?;

        Ok(match committed {
            Some(record) => record.into_reference(submitter, Some(kind)),
            None => AnchorReference::pending(hash, NetworkId::Primary, submitter, Some(kind)),
        })
    }
}

#[async_trait]
impl NetworkBackend for AptosBackend {
    fn network(&self) -> NetworkId {
        NetworkId::Primary
    }

    fn is_well_formed(&self, reference: &str) -> bool {
        is_transaction_hash(reference)
    }

    async fn submit_record(
        &self,
        wallet: &dyn WalletAdapter,
        submitter: &str,
        content: &[u8],
        kind: RecordKind,
    ) -> ChainResult<AnchorReference> {
        match self.registry_payload(kind, content) {
            Some(payload) => {
                match self.submit_and_confirm(wallet, &payload, submitter, kind).await {
                    Ok(reference) if reference.status != AnchorStatus::Failed => {
                        return Ok(reference);
                    }
                    Ok(reference) => {
                        tracing::warn!(
                            tx_hash = %reference.id,
                            function = %payload.function,
                            "Registry call failed on chain, falling back to liveness transfer"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            function = %payload.function,
                            "Registry call rejected, falling back to liveness transfer"
                        );
                    }
                }
            }
            None => tracing::debug!("No registry configured, using liveness transfer"),
        }

        let payload = Self::liveness_payload(submitter);
        self.submit_and_confirm(wallet, &payload, submitter, kind).await
    }

    async fn lookup(&self, reference: &str) -> ChainResult<AnchorReference> {
        let client = self.pool.aptos()?;
        let record = client.get_transaction_by_hash(reference).await?;
        Ok(record.into_reference("", None))
    }
}
