//! Aptos fullnode REST client.
//!
//! # Responsibilities
//! - Bind to the configured fullnode endpoints (primary + failovers)
//! - Read account sequence numbers and transactions
//! - Encode and submit signed transactions
//!
//! No liveness probe runs at construction time; an unreachable node is only
//! discovered by the first request.

use crate::blockchain::aptos::types::{
    AccountInfo, PendingTransaction, SignedSubmitRequest, SubmitRequest, TransactionRecord,
};
use crate::blockchain::rest::RestClient;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::config::schema::PrimaryChainConfig;

/// Client handle for the primary chain.
#[derive(Clone)]
pub struct AptosClient {
    rest: RestClient,
    config: PrimaryChainConfig,
}

impl AptosClient {
    /// Create a new client. Fails only on invalid configuration.
    pub fn new(config: PrimaryChainConfig) -> ChainResult<Self> {
        let rest = RestClient::new(&config.rpc_url, &config.failover_urls, config.rpc_timeout_secs)?;

        tracing::debug!(
            rpc_url = %config.rpc_url,
            endpoints = rest.endpoint_count(),
            "Aptos client constructed"
        );

        Ok(Self { rest, config })
    }

    /// Fetch the on-chain account, mainly for its sequence number.
    pub async fn get_account(&self, address: &str) -> ChainResult<AccountInfo> {
        self.rest
            .get_json(&format!("accounts/{}", address))
            .await
            .map_err(|e| match e {
                ChainError::NotFound(_) => {
                    ChainError::Rejected(format!("account {} does not exist on chain", address))
                }
                other => other,
            })
    }

    /// Ask the node for the BCS signing message of an unsigned transaction.
    pub async fn encode_submission(&self, request: &SubmitRequest) -> ChainResult<Vec<u8>> {
        let encoded: String = self
            .rest
            .post_json("transactions/encode_submission", request)
            .await?;
        let encoded = encoded.strip_prefix("0x").unwrap_or(&encoded);

        hex::decode(encoded)
            .map_err(|e| ChainError::InvalidResponse(format!("signing message is not hex: {}", e)))
    }

    /// Submit a signed transaction; returns once the node accepted it.
    pub async fn submit_transaction(
        &self,
        request: &SignedSubmitRequest,
    ) -> ChainResult<PendingTransaction> {
        self.rest.post_json("transactions", request).await
    }

    /// Look up a transaction (pending or committed) by hash.
    pub async fn get_transaction_by_hash(&self, hash: &str) -> ChainResult<TransactionRecord> {
        self.rest
            .get_json(&format!("transactions/by_hash/{}", hash))
            .await
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrimaryChainConfig {
        &self.config
    }

    /// Endpoint tried first for every request.
    pub fn endpoint(&self) -> &str {
        self.rest.primary_endpoint()
    }
}

impl std::fmt::Debug for AptosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AptosClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
