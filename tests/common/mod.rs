//! Shared fixtures for integration tests: mock Aptos and Horizon servers
//! and fully wired contexts pointing at them.

#![allow(dead_code)]

use httpmock::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use review_anchor::anchor::AnchorCache;
use review_anchor::blockchain::aptos::{derive_address, AptosKeyWallet};
use review_anchor::blockchain::backend::NetworkRegistry;
use review_anchor::blockchain::pool::ClientPool;
use review_anchor::blockchain::stellar::StellarKeyWallet;
use review_anchor::blockchain::wallet::{signing_key_from_hex, WalletAdapter};
use review_anchor::session::{FileStore, KeyValueStore};
use review_anchor::{AnchorConfig, AnchorContext, NetworkId};

pub const PRIMARY_SEED: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";
pub const SECONDARY_SEED: &str = "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb";

/// Address the primary wallet derives from [`PRIMARY_SEED`].
pub fn primary_address() -> String {
    let key = signing_key_from_hex(PRIMARY_SEED).unwrap();
    derive_address(&key.verifying_key())
}

/// Account id the secondary wallet derives from [`SECONDARY_SEED`].
pub fn secondary_account() -> String {
    let key = signing_key_from_hex(SECONDARY_SEED).unwrap();
    StellarKeyWallet::new(&key).account_id().to_string()
}

/// Configuration with both chains on `server` and state under `dir`.
pub fn config_for(server: &MockServer, dir: &Path) -> AnchorConfig {
    let mut config = AnchorConfig::default();
    config.primary.rpc_url = server.url("/v1");
    config.primary.confirmation_poll_ms = 10;
    config.primary.confirmation_timeout_secs = 2;
    config.secondary.horizon_url = server.base_url();
    config.session.store_path = dir.join("state.json").to_string_lossy().into_owned();
    config.retries.base_delay_ms = 1;
    config.retries.max_delay_ms = 2;
    config
}

/// Context with local-key wallets for both networks and a file store.
pub fn context_for(config: &AnchorConfig) -> AnchorContext {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.session.store_path));
    context_with_store(config, store)
}

pub fn context_with_store(config: &AnchorConfig, store: Arc<dyn KeyValueStore>) -> AnchorContext {
    let pool = Arc::new(ClientPool::from_config(config));
    let registry = NetworkRegistry::live(pool.clone(), config);

    let mut wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>> = HashMap::new();
    wallets.insert(
        NetworkId::Primary,
        Arc::new(AptosKeyWallet::new(
            signing_key_from_hex(PRIMARY_SEED).unwrap(),
            pool.clone(),
        )),
    );
    wallets.insert(
        NetworkId::Secondary,
        Arc::new(StellarKeyWallet::new(&signing_key_from_hex(SECONDARY_SEED).unwrap())),
    );

    AnchorContext::new(config, pool, registry, wallets, store, AnchorCache::new(None))
}

/// Mock the whole primary-chain submission path for `sender`: account
/// read, signing-message encoding, submission and a committed lookup.
pub async fn mock_aptos_submission(server: &MockServer, sender: &str, hash: &str, version: u64) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/v1/accounts/{}", sender));
            then.status(200).json_body(json!({
                "sequence_number": "4",
                "authentication_key": sender
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/transactions/encode_submission");
            then.status(200).json_body(json!("0xb5e97db07fa0bd0e5598aa3643a9bc6f"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/transactions");
            then.status(202).json_body(json!({ "hash": hash }));
        })
        .await;
    mock_aptos_transaction(server, hash, sender, version).await;
}

/// Committed, successful primary-chain transaction.
pub async fn mock_aptos_transaction(server: &MockServer, hash: &str, sender: &str, version: u64) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/v1/transactions/by_hash/{}", hash));
            then.status(200).json_body(json!({
                "type": "user_transaction",
                "hash": hash,
                "sender": sender,
                "success": true,
                "vm_status": "Executed successfully",
                "version": version.to_string(),
                "gas_used": "7",
                "timestamp": "1700000000000000"
            }));
        })
        .await;
}

/// Horizon record of a successful secondary-chain transaction.
pub async fn mock_horizon_transaction(server: &MockServer, hash: &str, source: &str, ledger: u64) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/transactions/{}", hash));
            then.status(200).json_body(json!({
                "hash": hash,
                "successful": true,
                "ledger": ledger,
                "fee_charged": "100",
                "source_account": source,
                "created_at": "2024-01-01T00:00:00Z"
            }));
        })
        .await;
}
