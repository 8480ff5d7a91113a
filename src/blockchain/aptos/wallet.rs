//! Local-key wallet for the primary chain.
//!
//! Holds an ed25519 signing key and signs through the node's
//! encode-submission endpoint, so no BCS encoding happens client-side.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use sha3::{Digest, Sha3_256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::blockchain::aptos::transaction::TxBuilder;
use crate::blockchain::aptos::types::EntryFunctionPayload;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::wallet::{
    signing_key_from_env, WalletAdapter, WalletError, WalletResult, PRIMARY_KEY_ENV_VAR,
};

/// Authentication-key scheme byte for single ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// Derive the account address of a single-key ed25519 account.
pub fn derive_address(public_key: &VerifyingKey) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.as_bytes());
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Wallet adapter backed by a key held in process memory.
pub struct AptosKeyWallet {
    signing_key: SigningKey,
    address: String,
    pool: Arc<ClientPool>,
    connected: AtomicBool,
}

impl AptosKeyWallet {
    pub fn new(signing_key: SigningKey, pool: Arc<ClientPool>) -> Self {
        let address = derive_address(&signing_key.verifying_key());
        Self {
            signing_key,
            address,
            pool,
            connected: AtomicBool::new(false),
        }
    }

    /// Load the key from `REVIEW_ANCHOR_PRIMARY_KEY`.
    pub fn from_env(pool: Arc<ClientPool>) -> WalletResult<Self> {
        let key = signing_key_from_env(PRIMARY_KEY_ENV_VAR)?.ok_or_else(|| {
            WalletError::Key(format!("Environment variable {} not set", PRIMARY_KEY_ENV_VAR))
        })?;
        Ok(Self::new(key, pool))
    }
}

#[async_trait]
impl WalletAdapter for AptosKeyWallet {
    fn label(&self) -> &str {
        "Aptos Key Wallet"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn address(&self) -> Option<String> {
        self.is_connected().then(|| self.address.clone())
    }

    async fn connect(&self) -> WalletResult<String> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(address = %self.address, "Aptos key wallet connected");
        Ok(self.address.clone())
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> WalletResult<String> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }

        let client = self
            .pool
            .aptos()
            .map_err(|e| WalletError::Unreachable(e.to_string()))?;

        let request = TxBuilder::new(&client)
            .build(&self.address, payload.clone())
            .await?;
        let message = client.encode_submission(&request).await?;
        let signature = self.signing_key.sign(&message);

        let signed = request.sign(
            &self.signing_key.verifying_key().to_bytes(),
            &signature.to_bytes(),
        );
        let pending = client.submit_transaction(&signed).await?;

        tracing::info!(
            tx_hash = %pending.hash,
            function = %payload.function,
            "Transaction submitted"
        );
        Ok(pending.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::signing_key_from_hex;
    use crate::config::schema::{PrimaryChainConfig, SecondaryChainConfig};
    use httpmock::prelude::*;
    use serde_json::json;

    const TEST_SEED: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";

    #[test]
    fn test_address_shape() {
        let key = signing_key_from_hex(TEST_SEED).unwrap();
        let address = derive_address(&key.verifying_key());
        assert_eq!(address.len(), 66);
        assert!(address.starts_with("0x"));
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_sign_requires_connection() {
        let pool = Arc::new(ClientPool::new(
            PrimaryChainConfig::default(),
            SecondaryChainConfig::default(),
        ));
        let wallet = AptosKeyWallet::new(signing_key_from_hex(TEST_SEED).unwrap(), pool);
        assert!(wallet.address().is_none());

        let payload = EntryFunctionPayload::new("0x1::aptos_account::transfer", vec![]);
        let result = wallet.sign_and_submit(&payload).await;
        assert!(matches!(result, Err(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn test_sign_and_submit_flow() {
        let server = MockServer::start_async().await;
        let key = signing_key_from_hex(TEST_SEED).unwrap();
        let address = derive_address(&key.verifying_key());

        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/v1/accounts/{}", address));
                then.status(200).json_body(json!({"sequence_number": "0"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/transactions/encode_submission");
                then.status(200).json_body(json!("0x0102"));
            })
            .await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/transactions");
                then.status(202).json_body(json!({"hash": format!("0x{}", "ab".repeat(32))}));
            })
            .await;

        let pool = Arc::new(ClientPool::new(
            PrimaryChainConfig {
                rpc_url: server.url("/v1"),
                ..PrimaryChainConfig::default()
            },
            SecondaryChainConfig::default(),
        ));
        pool.initialize();

        let wallet = AptosKeyWallet::new(key, pool);
        wallet.connect().await.unwrap();
        let hash = wallet
            .sign_and_submit(&EntryFunctionPayload::new("0x1::aptos_account::transfer", vec![]))
            .await
            .unwrap();

        assert_eq!(hash.len(), 66);
        assert_eq!(submit.hits_async().await, 1);
    }
}
