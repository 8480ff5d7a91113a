//! Caller-facing façade.
//!
//! `AnchorContext` owns the pool, the session manager and both services,
//! mirrors the outcome of each operation into a [`ContextSnapshot`], and
//! publishes the snapshot on a `watch` channel.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::anchor::{AnchorCache, AnchorService};
use crate::blockchain::aptos::AptosKeyWallet;
use crate::blockchain::backend::NetworkRegistry;
use crate::blockchain::pool::{ClientPool, ClientStatus};
use crate::blockchain::stellar::StellarKeyWallet;
use crate::blockchain::types::{AnchorReference, NetworkId, RecordKind};
use crate::blockchain::wallet::WalletAdapter;
use crate::config::schema::AnchorConfig;
use crate::error::{AnchorError, AnchorResult};
use crate::session::{FileStore, KeyValueStore, SessionManager};
use crate::verification::VerificationService;

/// Observable state of the context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextSnapshot {
    pub is_initialized: bool,
    pub is_connected: bool,
    pub address: Option<String>,
    pub network: NetworkId,
    pub wallet_name: Option<String>,
    pub last_error: Option<AnchorError>,
    pub is_verifying: bool,
    pub latest_transaction: Option<AnchorReference>,
}

pub struct AnchorContext {
    pool: Arc<ClientPool>,
    sessions: Arc<SessionManager>,
    anchoring: AnchorService,
    verification: VerificationService,
    state: watch::Sender<ContextSnapshot>,
}

impl AnchorContext {
    /// Assemble a context from explicit collaborators.
    pub fn new(
        config: &AnchorConfig,
        pool: Arc<ClientPool>,
        registry: NetworkRegistry,
        wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>>,
        store: Arc<dyn KeyValueStore>,
        cache: AnchorCache,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            pool.clone(),
            wallets,
            store,
            config.session.clone(),
        ));
        let anchoring = AnchorService::new(
            pool.clone(),
            registry.clone(),
            sessions.clone(),
            cache.clone(),
            config.anchoring.clone(),
        );
        let verification =
            VerificationService::new(pool.clone(), registry, sessions.clone(), cache, config);
        let (state, _) = watch::channel(ContextSnapshot {
            network: sessions.network(),
            ..ContextSnapshot::default()
        });

        Self {
            pool,
            sessions,
            anchoring,
            verification,
            state,
        }
    }

    /// Build the live stack: REST clients, local-key wallets, the file
    /// store at `session.store_path` and the optional reference cache.
    pub fn from_config(config: &AnchorConfig) -> Self {
        let pool = Arc::new(ClientPool::from_config(config));
        let registry = NetworkRegistry::live(pool.clone(), config);

        let mut wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>> = HashMap::new();
        match AptosKeyWallet::from_env(pool.clone()) {
            Ok(wallet) => {
                wallets.insert(NetworkId::Primary, Arc::new(wallet));
            }
            Err(e) => tracing::warn!(error = %e, "No primary-chain wallet available"),
        }
        match StellarKeyWallet::from_env_or_random() {
            Ok(wallet) => {
                wallets.insert(NetworkId::Secondary, Arc::new(wallet));
            }
            Err(e) => tracing::warn!(error = %e, "No secondary-chain wallet available"),
        }

        let store = Arc::new(FileStore::new(&config.session.store_path));
        let cache = match &config.anchoring.cache_path {
            Some(path) => AnchorCache::load_from_file(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Anchor cache unreadable, starting empty");
                AnchorCache::new(Some(PathBuf::from(path)))
            }),
            None => AnchorCache::new(None),
        };

        Self::new(config, pool, registry, wallets, store, cache)
    }

    /// Initialize network clients and restore any persisted session.
    ///
    /// Never fails; degraded clients surface as errors on later operations.
    pub fn start(&self) {
        self.pool.initialize();
        self.sessions.rehydrate();
        self.publish(|_| {});
        tracing::info!(
            network = %self.sessions.network(),
            connected = self.sessions.is_connected(),
            "Anchor context started"
        );
    }

    /// Connect the active network's wallet.
    pub async fn connect_wallet(&self) -> AnchorResult<String> {
        let sessions = self.sessions.clone();
        self.run("connect_wallet", async move { sessions.connect().await })
            .await
    }

    /// Disconnect the active network's wallet. Always succeeds.
    pub async fn disconnect_wallet(&self) {
        let sessions = self.sessions.clone();
        let _ = self
            .run("disconnect_wallet", async move {
                sessions.disconnect().await;
                Ok(())
            })
            .await;
    }

    /// Tear down the current session and make `target` active.
    pub async fn switch_network(&self, target: NetworkId) {
        let sessions = self.sessions.clone();
        let _ = self
            .run("switch_network", async move {
                sessions.switch_network(target).await;
                Ok(())
            })
            .await;
    }

    /// Anchor `content` and return the reference id.
    ///
    /// `is_verifying` is raised for the whole submission and lowered again
    /// whatever the outcome.
    pub async fn create_record(&self, content: &[u8], kind: RecordKind) -> AnchorResult<String> {
        self.publish(|s| s.is_verifying = true);
        let result = self
            .run("create_record", self.anchoring.create_record(content, kind))
            .await;
        match result {
            Ok(reference) => {
                let id = reference.id.clone();
                self.publish(|s| {
                    s.is_verifying = false;
                    s.latest_transaction = Some(reference);
                });
                Ok(id)
            }
            Err(e) => {
                self.publish(|s| s.is_verifying = false);
                Err(e)
            }
        }
    }

    /// Syntactic check of a reference id.
    pub fn verify_record(&self, id: &str) -> bool {
        self.verification.verify(id)
    }

    /// Current on-chain status of a reference, published as the latest
    /// transaction.
    pub async fn get_verification_status(&self, id: &str) -> AnchorResult<AnchorReference> {
        let reference = self
            .run("get_verification_status", self.verification.get_status(id))
            .await?;
        self.publish(|s| s.latest_transaction = Some(reference.clone()));
        Ok(reference)
    }

    pub fn clear_error(&self) {
        self.publish(|s| s.last_error = None);
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ContextSnapshot> {
        self.state.subscribe()
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.is_initialized()
    }

    pub fn is_connected(&self) -> bool {
        self.sessions.is_connected()
    }

    pub fn address(&self) -> Option<String> {
        self.sessions.address()
    }

    pub fn network(&self) -> NetworkId {
        self.sessions.network()
    }

    pub fn wallet_name(&self) -> Option<String> {
        self.sessions.wallet_name()
    }

    pub fn last_error(&self) -> Option<AnchorError> {
        self.state.borrow().last_error.clone()
    }

    /// Readiness of each network client.
    pub fn client_status(&self) -> Vec<ClientStatus> {
        self.pool.status()
    }

    /// Run one façade operation in its own span, clearing `last_error`
    /// first and recording any failure afterwards.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> AnchorResult<T>
    where
        F: Future<Output = AnchorResult<T>>,
    {
        let op_id = Uuid::new_v4();
        let span = tracing::info_span!("op", operation, %op_id);

        self.publish(|s| s.last_error = None);
        let result = fut.instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(_) => tracing::debug!("Operation complete"),
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "Operation failed"),
        });
        let error = result.as_ref().err().cloned();
        self.publish(|s| s.last_error = error);
        result
    }

    /// Refresh the derived fields, apply `update`, and notify subscribers.
    fn publish(&self, update: impl FnOnce(&mut ContextSnapshot)) {
        let is_initialized = self.pool.is_initialized();
        let is_connected = self.sessions.is_connected();
        let address = self.sessions.address();
        let network = self.sessions.network();
        let wallet_name = self.sessions.wallet_name();

        self.state.send_modify(|s| {
            s.is_initialized = is_initialized;
            s.is_connected = is_connected;
            s.address = address;
            s.network = network;
            s.wallet_name = wallet_name;
            update(s);
        });
    }
}

impl std::fmt::Debug for AnchorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorContext")
            .field("network", &self.sessions.network())
            .field("connected", &self.sessions.is_connected())
            .field("initialized", &self.pool.is_initialized())
            .finish()
    }
}
