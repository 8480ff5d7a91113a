//! Secondary-chain anchoring backend.
//!
//! Records are expressed as a `MANAGE_DATA` transaction built from the
//! session account. The transaction is hashed but not submitted, so the
//! reference stays `Pending` until the hash shows up on Horizon.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::blockchain::backend::NetworkBackend;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::stellar::is_transaction_hash;
use crate::blockchain::stellar::strkey::decode_account_id;
use crate::blockchain::stellar::xdr::{ManageDataTransaction, DATA_MAX_LEN};
use crate::blockchain::types::{
    AnchorReference, ChainError, ChainResult, NetworkId, RecordKind,
};
use crate::blockchain::wallet::WalletAdapter;
use crate::config::schema::SecondaryChainConfig;

pub struct StellarBackend {
    pool: Arc<ClientPool>,
    config: SecondaryChainConfig,
}

impl StellarBackend {
    pub fn new(pool: Arc<ClientPool>, config: SecondaryChainConfig) -> Self {
        Self { pool, config }
    }

    /// Next sequence number for `account_id`, or 1 for unknown accounts.
    async fn next_sequence(&self, account_id: &str) -> i64 {
        let client = match self.pool.horizon() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Horizon client unavailable, using sequence 1");
                return 1;
            }
        };
        match client.get_account(account_id).await {
            Ok(account) => (account.sequence as i64).saturating_add(1),
            Err(ChainError::NotFound(_)) => {
                tracing::debug!(account_id = %account_id, "Account not on ledger, using sequence 1");
                1
            }
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "Sequence lookup failed, using sequence 1");
                1
            }
        }
    }

    pub fn build_transaction(
        &self,
        source: [u8; 32],
        sequence: i64,
        content: &[u8],
        kind: RecordKind,
    ) -> ManageDataTransaction {
        let now = Utc::now();
        // Empty content still writes an (empty) entry; a missing value would delete it.
        let value = &content[..content.len().min(DATA_MAX_LEN)];
        ManageDataTransaction {
            source,
            fee: self.config.base_fee,
            sequence,
            min_time: 0,
            max_time: now.timestamp().max(0) as u64 + self.config.tx_timeout_secs,
            data_name: format!("record_{}_{}", kind, now.timestamp_millis()),
            data_value: Some(value.to_vec()),
        }
    }
}

#[async_trait]
impl NetworkBackend for StellarBackend {
    fn network(&self) -> NetworkId {
        NetworkId::Secondary
    }

    fn is_well_formed(&self, reference: &str) -> bool {
        is_transaction_hash(reference)
    }

    async fn submit_record(
        &self,
        _wallet: &dyn WalletAdapter,
        submitter: &str,
        content: &[u8],
        kind: RecordKind,
    ) -> ChainResult<AnchorReference> {
        let source = decode_account_id(submitter)
            .map_err(|e| ChainError::Rejected(format!("invalid source account {}: {}", submitter, e)))?;

        let sequence = self.next_sequence(submitter).await;
        let tx = self.build_transaction(source, sequence, content, kind);
        let hash = hex::encode(tx.hash(&self.config.network_passphrase));

        tracing::info!(
            tx_hash = %hash,
            data_name = %tx.data_name,
            sequence = sequence,
            "Stellar record transaction built"
        );

        Ok(AnchorReference::pending(hash, NetworkId::Secondary, submitter, Some(kind)))
    }

    async fn lookup(&self, reference: &str) -> ChainResult<AnchorReference> {
        let client = self.pool.horizon()?;
        let tx = client.get_transaction(reference).await?;
        Ok(tx.into_reference(None))
    }
}
