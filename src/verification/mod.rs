//! Verification query service.
//!
//! `verify` is purely syntactic. `get_status` reads the owning chain,
//! retrying transport failures, and merges the result into the cache so
//! identity fields recorded at creation survive.

use std::sync::Arc;

use crate::anchor::{synthesize, AnchorCache};
use crate::blockchain::backend::NetworkRegistry;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::types::{AnchorReference, NetworkId};
use crate::config::schema::{AnchorConfig, FallbackPolicy, RetryConfig};
use crate::error::{AnchorError, AnchorResult};
use crate::observability::metrics;
use crate::resilience::{retry_read, with_timeout};
use crate::session::SessionManager;

/// Submitter reported for synthetic lookups with nothing better known.
const UNKNOWN_SUBMITTER: &str = "0x1";

pub struct VerificationService {
    pool: Arc<ClientPool>,
    registry: NetworkRegistry,
    sessions: Arc<SessionManager>,
    cache: AnchorCache,
    retries: RetryConfig,
    fallback: FallbackPolicy,
    lookup_timeouts: [u64; 2],
}

impl VerificationService {
    pub fn new(
        pool: Arc<ClientPool>,
        registry: NetworkRegistry,
        sessions: Arc<SessionManager>,
        cache: AnchorCache,
        config: &AnchorConfig,
    ) -> Self {
        // Each endpoint gets its own request timeout during failover.
        let primary = config.primary.rpc_timeout_secs * (1 + config.primary.failover_urls.len() as u64);
        let secondary =
            config.secondary.rpc_timeout_secs * (1 + config.secondary.failover_urls.len() as u64);
        Self {
            pool,
            registry,
            sessions,
            cache,
            retries: config.retries.clone(),
            fallback: config.anchoring.fallback,
            lookup_timeouts: [primary, secondary],
        }
    }

    /// Whether `id` is a well-formed reference for any registered network.
    pub fn verify(&self, id: &str) -> bool {
        self.registry.owner_of(id).is_some()
    }

    /// Current on-chain status of `id`.
    pub async fn get_status(&self, id: &str) -> AnchorResult<AnchorReference> {
        let Some(network) = self.registry.owner_of(id) else {
            return Err(AnchorError::LookupFailed(format!(
                "'{}' is not a recognized transaction id",
                id
            )));
        };
        let Some(backend) = self.registry.get(network) else {
            return Err(AnchorError::LookupFailed(format!("no backend for the {} network", network)));
        };

        let secs = self.lookup_timeout(network);
        let result = retry_read(&self.retries, "status lookup", || {
            with_timeout(secs, backend.lookup(id))
        })
        .await;

        match result {
            Ok(observed) => {
                metrics::record_status_lookup(network, "found");
                let merged = self.cache.refine_or_insert(observed);
                tracing::debug!(
                    network = %network,
                    tx_hash = %id,
                    status = ?merged.status,
                    "Status lookup complete"
                );
                Ok(merged)
            }
            Err(e) => {
                if e.is_unreachable() {
                    self.pool.rebuild(network);
                }
                let cached = self.cache.get(id);
                let submitter = cached
                    .as_ref()
                    .map(|r| r.submitter.clone())
                    .or_else(|| self.sessions.address())
                    .unwrap_or_else(|| UNKNOWN_SUBMITTER.to_string());
                let kind = cached.and_then(|r| r.kind);

                if let Some(reference) = synthesize(self.fallback, network, Some(id), &submitter, kind) {
                    tracing::warn!(network = %network, tx_hash = %id, error = %e, "Lookup failed, returning synthetic status");
                    metrics::record_status_lookup(network, "synthetic");
                    return Ok(self.cache.refine_or_insert(reference));
                }

                tracing::warn!(network = %network, tx_hash = %id, error = %e, "Lookup failed");
                metrics::record_status_lookup(network, "failed");
                Err(AnchorError::lookup(e))
            }
        }
    }

    fn lookup_timeout(&self, network: NetworkId) -> u64 {
        match network {
            NetworkId::Primary => self.lookup_timeouts[0],
            NetworkId::Secondary => self.lookup_timeouts[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{AnchorStatus, RecordKind};
    use crate::session::MemoryStore;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn service(server: &MockServer, fallback: FallbackPolicy) -> VerificationService {
        let mut config = AnchorConfig::default();
        config.primary.rpc_url = server.url("/v1");
        config.secondary.horizon_url = server.base_url();
        config.anchoring.fallback = fallback;
        config.retries.base_delay_ms = 1;
        config.retries.max_delay_ms = 2;

        let pool = Arc::new(ClientPool::from_config(&config));
        pool.initialize();
        let sessions = Arc::new(SessionManager::new(
            pool.clone(),
            HashMap::new(),
            Arc::new(MemoryStore::new()),
            config.session.clone(),
        ));
        let registry = NetworkRegistry::live(pool.clone(), &config);
        VerificationService::new(pool, registry, sessions, AnchorCache::new(None), &config)
    }

    #[test]
    fn test_verify_is_syntactic() {
        let server = MockServer::start();
        let svc = service(&server, FallbackPolicy::Strict);

        assert!(svc.verify(&format!("0x{}", "ab".repeat(32))));
        assert!(svc.verify(&"ab".repeat(32)));
        assert!(!svc.verify("not-a-valid-id"));
        assert!(!svc.verify(""));
    }

    #[tokio::test]
    async fn test_malformed_id_always_fails() {
        let server = MockServer::start_async().await;
        let svc = service(&server, FallbackPolicy::Simulated);
        let err = svc.get_status("not-a-valid-id").await.unwrap_err();
        assert_eq!(err.kind(), "lookup_failed");
    }

    #[tokio::test]
    async fn test_primary_status_refines_cache() {
        let server = MockServer::start_async().await;
        let hash = format!("0x{}", "ab".repeat(32));
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/v1/transactions/by_hash/{}", hash));
                then.status(200).json_body(json!({
                    "type": "user_transaction",
                    "hash": hash,
                    "sender": "0xbb",
                    "success": true,
                    "version": "991",
                    "gas_used": "5",
                    "timestamp": "1700000000000000"
                }));
            })
            .await;

        let svc = service(&server, FallbackPolicy::Strict);
        svc.cache.record(AnchorReference::pending(
            hash.clone(),
            NetworkId::Primary,
            "0xbb",
            Some(RecordKind::Review),
        ));

        let status = svc.get_status(&hash).await.unwrap();
        assert_eq!(status.status, AnchorStatus::Success);
        assert_eq!(status.block_height, Some(991));
        assert_eq!(status.cost, Some(5));
        assert_eq!(status.kind, Some(RecordKind::Review));
        assert_eq!(svc.cache.get(&hash).unwrap().status, AnchorStatus::Success);
    }

    #[tokio::test]
    async fn test_secondary_status() {
        let server = MockServer::start_async().await;
        let hash = "cd".repeat(32);
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/transactions/{}", hash));
                then.status(200).json_body(json!({
                    "hash": hash,
                    "successful": false,
                    "ledger": 77,
                    "fee_charged": 100
                }));
            })
            .await;

        let svc = service(&server, FallbackPolicy::Strict);
        let status = svc.get_status(&hash).await.unwrap();
        assert_eq!(status.network, NetworkId::Secondary);
        assert_eq!(status.status, AnchorStatus::Failed);
        assert_eq!(status.block_height, Some(77));
    }

    #[tokio::test]
    async fn test_strict_lookup_failure() {
        let server = MockServer::start_async().await;
        let hash = format!("0x{}", "01".repeat(32));
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/v1/transactions/by_hash/{}", hash));
                then.status(503).body("unavailable");
            })
            .await;

        let svc = service(&server, FallbackPolicy::Strict);
        let err = svc.get_status(&hash).await.unwrap_err();
        assert_eq!(err.kind(), "lookup_failed");
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn test_simulated_lookup_failure() {
        let server = MockServer::start_async().await;
        let hash = format!("0x{}", "02".repeat(32));
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/v1/transactions/by_hash/{}", hash));
                then.status(404).json_body(json!({"message": "not found"}));
            })
            .await;

        let svc = service(&server, FallbackPolicy::Simulated);
        let status = svc.get_status(&hash).await.unwrap();
        assert!(status.synthetic);
        assert_eq!(status.id, hash);
        assert_eq!(status.submitter, UNKNOWN_SUBMITTER);
        assert_eq!(status.status, AnchorStatus::Success);
    }
}
