//! Transaction building and confirmation monitoring.
//!
//! # Responsibilities
//! - Build unsigned submissions with the account's current sequence number
//! - Poll a submitted transaction until it commits or the deadline passes

use chrono::Utc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::aptos::client::AptosClient;
use crate::blockchain::aptos::types::{EntryFunctionPayload, SubmitRequest, TransactionRecord};
use crate::blockchain::types::{ChainError, ChainResult};

/// Transaction builder bound to one client.
pub struct TxBuilder<'a> {
    client: &'a AptosClient,
}

impl<'a> TxBuilder<'a> {
    pub fn new(client: &'a AptosClient) -> Self {
        Self { client }
    }

    /// Build an unsigned submission for `sender`.
    pub async fn build(
        &self,
        sender: &str,
        payload: EntryFunctionPayload,
    ) -> ChainResult<SubmitRequest> {
        let account = self.client.get_account(sender).await?;
        let config = self.client.config();
        let expiration = Utc::now().timestamp().max(0) as u64 + config.tx_expiration_secs;

        Ok(SubmitRequest {
            sender: sender.to_string(),
            sequence_number: account.sequence_number.to_string(),
            max_gas_amount: config.max_gas_amount.to_string(),
            gas_unit_price: config.gas_unit_price.to_string(),
            expiration_timestamp_secs: expiration.to_string(),
            payload,
        })
    }

    /// Wait for a transaction to commit.
    ///
    /// Returns `Ok(None)` if it is still pending when `timeout_secs` elapses.
    /// Lookup errors while polling are logged and polling continues; a
    /// freshly submitted hash is often not visible on every node yet.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: &str,
        timeout_secs: u64,
    ) -> ChainResult<Option<TransactionRecord>> {
        let poll_interval = Duration::from_millis(self.client.config().confirmation_poll_ms.max(1));

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.client.get_transaction_by_hash(tx_hash).await {
                    Ok(record) if record.is_pending() => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    }
                    Ok(record) => return Ok::<_, ChainError>(record),
                    Err(ChainError::NotFound(_)) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction not visible yet");
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Confirmation poll failed");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(record) => record.map(Some),
            Err(_) => {
                tracing::info!(
                    tx_hash = %tx_hash,
                    timeout_secs = timeout_secs,
                    "Transaction not committed before deadline"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PrimaryChainConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> AptosClient {
        AptosClient::new(PrimaryChainConfig {
            rpc_url: server.url("/v1"),
            confirmation_poll_ms: 10,
            ..PrimaryChainConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_uses_chain_sequence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/accounts/0x7");
                then.status(200)
                    .json_body(json!({"sequence_number": "12", "authentication_key": "0x7"}));
            })
            .await;

        let client = client_for(&server);
        let request = TxBuilder::new(&client)
            .build("0x7", EntryFunctionPayload::new("0x1::aptos_account::transfer", vec![]))
            .await
            .unwrap();

        assert_eq!(request.sequence_number, "12");
        assert_eq!(request.max_gas_amount, client.config().max_gas_amount.to_string());
        let expiration: i64 = request.expiration_timestamp_secs.parse().unwrap();
        assert!(expiration > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_wait_returns_committed_record() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/transactions/by_hash/0xabc");
                then.status(200).json_body(json!({
                    "type": "user_transaction",
                    "hash": "0xabc",
                    "success": true,
                    "version": "10",
                    "gas_used": "4"
                }));
            })
            .await;

        let client = client_for(&server);
        let record = TxBuilder::new(&client)
            .wait_for_confirmation("0xabc", 5)
            .await
            .unwrap()
            .expect("committed");
        assert_eq!(record.version, Some(10));
    }

    #[tokio::test]
    async fn test_wait_times_out_as_pending() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/transactions/by_hash/0xdef");
                then.status(200).json_body(json!({
                    "type": "pending_transaction",
                    "hash": "0xdef"
                }));
            })
            .await;

        let client = client_for(&server);
        let record = TxBuilder::new(&client)
            .wait_for_confirmation("0xdef", 1)
            .await
            .unwrap();
        assert!(record.is_none());
    }
}
