//! Record anchoring service.
//!
//! # Flow
//! ```text
//! create_record(content, kind)
//!     → connected? initialized?
//!     → lock the active network
//!     → confirm a restored session
//!     → NetworkBackend::submit_record
//!     → on failure: fallback policy (strict → error, simulated → synthetic)
//!     → cache the reference
//! ```

pub mod cache;

use std::sync::Arc;

use crate::blockchain::backend::NetworkRegistry;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::types::{AnchorReference, NetworkId, RecordKind};
use crate::config::schema::{AnchoringConfig, FallbackPolicy};
use crate::error::{AnchorError, AnchorResult};
use crate::observability::metrics;
use crate::session::SessionManager;

pub use cache::AnchorCache;

pub struct AnchorService {
    pool: Arc<ClientPool>,
    registry: NetworkRegistry,
    sessions: Arc<SessionManager>,
    cache: AnchorCache,
    config: AnchoringConfig,
}

impl AnchorService {
    pub fn new(
        pool: Arc<ClientPool>,
        registry: NetworkRegistry,
        sessions: Arc<SessionManager>,
        cache: AnchorCache,
        config: AnchoringConfig,
    ) -> Self {
        Self {
            pool,
            registry,
            sessions,
            cache,
            config,
        }
    }

    /// Anchor `content` on the active network through the connected wallet.
    pub async fn create_record(
        &self,
        content: &[u8],
        kind: RecordKind,
    ) -> AnchorResult<AnchorReference> {
        if !self.sessions.is_connected() {
            return Err(AnchorError::NotConnected);
        }
        if !self.pool.is_initialized() {
            return Err(AnchorError::NotInitialized);
        }

        let (network, _guard) = self.sessions.lock_active().await;

        let session = self.sessions.ensure_confirmed().await?;
        if session.network != network {
            return Err(AnchorError::NotConnected);
        }
        let wallet = self.sessions.wallet(network).ok_or(AnchorError::NotConnected)?;
        let backend = self.registry.get(network).ok_or_else(|| {
            AnchorError::NetworkUnreachable(format!("no backend registered for the {} network", network))
        })?;

        tracing::info!(
            network = %network,
            kind = %kind,
            content_len = content.len(),
            "Anchoring record"
        );

        let reference = match backend
            .submit_record(wallet.as_ref(), &session.address, content, kind)
            .await
        {
            Ok(reference) => {
                metrics::record_anchor_submission(network, "submitted");
                reference
            }
            Err(e) => {
                if e.is_unreachable() {
                    self.pool.rebuild(network);
                }
                let err = AnchorError::submission(e);
                if err == AnchorError::NotConnected {
                    return Err(err);
                }
                match synthesize(self.config.fallback, network, None, &session.address, Some(kind)) {
                    Some(reference) => {
                        tracing::warn!(
                            network = %network,
                            error = %err,
                            tx_hash = %reference.id,
                            "Anchoring failed, returning synthetic reference"
                        );
                        metrics::record_anchor_submission(network, "synthetic");
                        reference
                    }
                    None => {
                        tracing::warn!(network = %network, error = %err, "Anchoring failed");
                        metrics::record_anchor_submission(network, "failed");
                        return Err(err);
                    }
                }
            }
        };

        tracing::info!(
            network = %network,
            tx_hash = %reference.id,
            status = ?reference.status,
            "Record anchored"
        );
        self.cache.record(reference.clone());
        Ok(reference)
    }

    pub fn cache(&self) -> &AnchorCache {
        &self.cache
    }
}

/// Synthetic reference under the `simulated` policy; `None` otherwise.
#[cfg(any(test, feature = "simulated"))]
pub(crate) fn synthesize(
    policy: FallbackPolicy,
    network: NetworkId,
    id: Option<&str>,
    submitter: &str,
    kind: Option<RecordKind>,
) -> Option<AnchorReference> {
    (policy == FallbackPolicy::Simulated).then(|| {
        crate::blockchain::simulated::synthesize_reference(network, id, submitter, kind)
    })
}

/// Without the `simulated` feature every failure is surfaced.
#[cfg(not(any(test, feature = "simulated")))]
pub(crate) fn synthesize(
    _policy: FallbackPolicy,
    _network: NetworkId,
    _id: Option<&str>,
    _submitter: &str,
    _kind: Option<RecordKind>,
) -> Option<AnchorReference> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::aptos::types::EntryFunctionPayload;
    use crate::blockchain::backend::NetworkBackend;
    use crate::blockchain::types::{AnchorStatus, ChainError, ChainResult};
    use crate::blockchain::wallet::{WalletAdapter, WalletResult};
    use crate::config::schema::{PrimaryChainConfig, SecondaryChainConfig, SessionConfig};
    use crate::session::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    const ADDR: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

    struct StaticWallet;

    #[async_trait]
    impl WalletAdapter for StaticWallet {
        fn label(&self) -> &str {
            "Static"
        }
        fn is_connected(&self) -> bool {
            true
        }
        fn address(&self) -> Option<String> {
            Some(ADDR.to_string())
        }
        async fn connect(&self) -> WalletResult<String> {
            Ok(ADDR.to_string())
        }
        async fn disconnect(&self) -> WalletResult<()> {
            Ok(())
        }
        async fn sign_and_submit(&self, _payload: &EntryFunctionPayload) -> WalletResult<String> {
            Ok(format!("0x{}", "ee".repeat(32)))
        }
    }

    /// Backend that fails with a fixed error, counting calls.
    struct FailingBackend {
        error: fn() -> ChainError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl NetworkBackend for FailingBackend {
        fn network(&self) -> NetworkId {
            NetworkId::Primary
        }
        fn is_well_formed(&self, reference: &str) -> bool {
            crate::blockchain::aptos::is_transaction_hash(reference)
        }
        async fn submit_record(
            &self,
            _wallet: &dyn WalletAdapter,
            _submitter: &str,
            _content: &[u8],
            _kind: RecordKind,
        ) -> ChainResult<AnchorReference> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
        async fn lookup(&self, _reference: &str) -> ChainResult<AnchorReference> {
            Err((self.error)())
        }
    }

    async fn service(
        backend: Arc<dyn NetworkBackend>,
        fallback: FallbackPolicy,
        connect: bool,
    ) -> AnchorService {
        let pool = Arc::new(ClientPool::new(
            PrimaryChainConfig::default(),
            SecondaryChainConfig::default(),
        ));
        pool.initialize();
        let mut wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>> = HashMap::new();
        wallets.insert(NetworkId::Primary, Arc::new(StaticWallet));
        let sessions = Arc::new(SessionManager::new(
            pool.clone(),
            wallets,
            Arc::new(MemoryStore::new()),
            SessionConfig::default(),
        ));
        sessions.rehydrate();
        if connect {
            sessions.connect().await.unwrap();
        }
        AnchorService::new(
            pool,
            NetworkRegistry::new().with_backend(backend),
            sessions,
            AnchorCache::new(None),
            AnchoringConfig {
                fallback,
                cache_path: None,
            },
        )
    }

    fn rejected() -> ChainError {
        ChainError::Rejected("INSUFFICIENT_BALANCE_FOR_TRANSACTION_FEE".into())
    }

    fn unreachable() -> ChainError {
        ChainError::Transport("connection refused".into())
    }

    #[tokio::test]
    async fn test_not_connected_checked_first() {
        let backend = Arc::new(FailingBackend { error: rejected, calls: AtomicU32::new(0) });
        let svc = service(backend.clone(), FallbackPolicy::Strict, false).await;

        let result = svc.create_record(b"text", RecordKind::Review).await;
        assert_eq!(result.unwrap_err(), AnchorError::NotConnected);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_errors() {
        let svc = service(
            Arc::new(FailingBackend { error: rejected, calls: AtomicU32::new(0) }),
            FallbackPolicy::Strict,
            true,
        )
        .await;
        let err = svc.create_record(b"text", RecordKind::Review).await.unwrap_err();
        assert_eq!(err.kind(), "submission_rejected");
        assert!(svc.cache().is_empty());

        let svc = service(
            Arc::new(FailingBackend { error: unreachable, calls: AtomicU32::new(0) }),
            FallbackPolicy::Strict,
            true,
        )
        .await;
        let err = svc.create_record(b"text", RecordKind::Review).await.unwrap_err();
        assert_eq!(err.kind(), "network_unreachable");
    }

    #[tokio::test]
    async fn test_simulated_policy_synthesizes() {
        let svc = service(
            Arc::new(FailingBackend { error: unreachable, calls: AtomicU32::new(0) }),
            FallbackPolicy::Simulated,
            true,
        )
        .await;

        let reference = svc.create_record(b"text", RecordKind::Cle).await.unwrap();
        assert!(reference.synthetic);
        assert_eq!(reference.status, AnchorStatus::Success);
        assert_eq!(reference.submitter, ADDR);
        assert!(crate::blockchain::aptos::is_transaction_hash(&reference.id));
        assert!(svc.cache().get(&reference.id).is_some());
    }

    #[tokio::test]
    async fn test_switch_without_wallet_leaves_disconnected() {
        let svc = service(
            Arc::new(FailingBackend { error: rejected, calls: AtomicU32::new(0) }),
            FallbackPolicy::Strict,
            false,
        )
        .await;
        svc.sessions.switch_network(NetworkId::Secondary).await;
        assert!(svc.sessions.connect().await.is_err());
        assert_eq!(
            svc.create_record(b"x", RecordKind::Review).await.unwrap_err(),
            AnchorError::NotConnected
        );
    }
}
