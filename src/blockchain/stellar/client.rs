//! Stellar Horizon REST client.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::blockchain::rest::{opt_u64_from_str_or_num, u64_from_str_or_num, RestClient};
use crate::blockchain::types::{AnchorReference, AnchorStatus, ChainResult, NetworkId, RecordKind};
use crate::config::schema::SecondaryChainConfig;

/// Subset of `GET /accounts/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HorizonAccount {
    pub account_id: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub sequence: u64,
}

/// Subset of `GET /transactions/{hash}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HorizonTransaction {
    pub hash: String,
    pub successful: bool,
    #[serde(default)]
    pub ledger: Option<u64>,
    #[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
    pub fee_charged: Option<u64>,
    #[serde(default)]
    pub source_account: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HorizonTransaction {
    pub fn into_reference(self, kind: Option<RecordKind>) -> AnchorReference {
        AnchorReference {
            id: self.hash,
            network: NetworkId::Secondary,
            submitter: self.source_account.unwrap_or_default(),
            submitted_at: self.created_at.unwrap_or_else(Utc::now),
            status: if self.successful {
                AnchorStatus::Success
            } else {
                AnchorStatus::Failed
            },
            block_height: self.ledger,
            cost: self.fee_charged,
            kind,
            synthetic: false,
        }
    }
}

/// Client handle for the secondary chain.
#[derive(Clone)]
pub struct HorizonClient {
    rest: RestClient,
    config: SecondaryChainConfig,
}

impl HorizonClient {
    pub fn new(config: SecondaryChainConfig) -> ChainResult<Self> {
        let rest = RestClient::new(&config.horizon_url, &config.failover_urls, config.rpc_timeout_secs)?;
        tracing::debug!(
            horizon_url = %config.horizon_url,
            endpoints = rest.endpoint_count(),
            "Horizon client constructed"
        );
        Ok(Self { rest, config })
    }

    pub async fn get_account(&self, account_id: &str) -> ChainResult<HorizonAccount> {
        self.rest.get_json(&format!("accounts/{}", account_id)).await
    }

    pub async fn get_transaction(&self, hash: &str) -> ChainResult<HorizonTransaction> {
        self.rest.get_json(&format!("transactions/{}", hash)).await
    }

    pub fn config(&self) -> &SecondaryChainConfig {
        &self.config
    }

    /// Endpoint tried first for every request.
    pub fn endpoint(&self) -> &str {
        self.rest.primary_endpoint()
    }
}

impl std::fmt::Debug for HorizonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizonClient")
            .field("horizon_url", &self.config.horizon_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
