//! Local-key wallet for the secondary chain.
//!
//! The key only provides an identity (the `G...` account id) for locally
//! built transactions; nothing is signed or submitted through it.

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::blockchain::aptos::types::EntryFunctionPayload;
use crate::blockchain::stellar::strkey::encode_account_id;
use crate::blockchain::wallet::{
    signing_key_from_env, WalletAdapter, WalletError, WalletResult, SECONDARY_KEY_ENV_VAR,
};

pub struct StellarKeyWallet {
    account_id: String,
    connected: AtomicBool,
}

impl StellarKeyWallet {
    pub fn new(signing_key: &SigningKey) -> Self {
        Self {
            account_id: encode_account_id(&signing_key.verifying_key().to_bytes()),
            connected: AtomicBool::new(false),
        }
    }

    /// Key from `REVIEW_ANCHOR_SECONDARY_KEY`, or a fresh random one.
    pub fn from_env_or_random() -> WalletResult<Self> {
        match signing_key_from_env(SECONDARY_KEY_ENV_VAR)? {
            Some(key) => Ok(Self::new(&key)),
            None => {
                let key = SigningKey::generate(&mut OsRng);
                let wallet = Self::new(&key);
                tracing::info!(
                    account_id = %wallet.account_id,
                    "{} not set, generated an ephemeral Stellar identity",
                    SECONDARY_KEY_ENV_VAR
                );
                Ok(wallet)
            }
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

#[async_trait]
impl WalletAdapter for StellarKeyWallet {
    fn label(&self) -> &str {
        "Stellar Wallet"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn address(&self) -> Option<String> {
        self.is_connected().then(|| self.account_id.clone())
    }

    async fn connect(&self) -> WalletResult<String> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(account_id = %self.account_id, "Stellar wallet connected");
        Ok(self.account_id.clone())
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_and_submit(&self, _payload: &EntryFunctionPayload) -> WalletResult<String> {
        Err(WalletError::Unsupported(
            "entry-function submission is not available on the secondary chain",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::stellar::strkey::{decode_account_id, ACCOUNT_ID_LEN};

    #[tokio::test]
    async fn test_connect_exposes_account_id() {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let wallet = StellarKeyWallet::new(&key);
        assert!(wallet.address().is_none());

        let address = wallet.connect().await.unwrap();
        assert_eq!(address.len(), ACCOUNT_ID_LEN);
        assert_eq!(decode_account_id(&address).unwrap(), key.verifying_key().to_bytes());
        assert_eq!(wallet.address(), Some(address));

        wallet.disconnect().await.unwrap();
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn test_submission_unsupported() {
        let wallet = StellarKeyWallet::new(&SigningKey::from_bytes(&[3u8; 32]));
        wallet.connect().await.unwrap();
        let payload = EntryFunctionPayload::new("0x1::aptos_account::transfer", vec![]);
        assert!(matches!(
            wallet.sign_and_submit(&payload).await,
            Err(WalletError::Unsupported(_))
        ));
    }
}
