//! Per-network anchoring interface and the registry that selects it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blockchain::aptos::AptosBackend;
use crate::blockchain::pool::ClientPool;
use crate::blockchain::stellar::StellarBackend;
use crate::blockchain::types::{AnchorReference, ChainResult, NetworkId, RecordKind};
use crate::blockchain::wallet::WalletAdapter;
use crate::config::schema::AnchorConfig;

/// What every supported chain provides to the anchoring and verification
/// services.
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    fn network(&self) -> NetworkId;

    /// Whether `reference` has the shape of this chain's transaction ids.
    fn is_well_formed(&self, reference: &str) -> bool;

    /// Anchor `content` on behalf of `submitter`.
    async fn submit_record(
        &self,
        wallet: &dyn WalletAdapter,
        submitter: &str,
        content: &[u8],
        kind: RecordKind,
    ) -> ChainResult<AnchorReference>;

    /// Read the on-chain state of a reference.
    async fn lookup(&self, reference: &str) -> ChainResult<AnchorReference>;
}

/// Backends keyed by network.
#[derive(Clone, Default)]
pub struct NetworkRegistry {
    backends: HashMap<NetworkId, Arc<dyn NetworkBackend>>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain-backed registry for both networks.
    pub fn live(pool: Arc<ClientPool>, config: &AnchorConfig) -> Self {
        Self::new()
            .with_backend(Arc::new(AptosBackend::new(pool.clone(), config.primary.clone())))
            .with_backend(Arc::new(StellarBackend::new(pool, config.secondary.clone())))
    }

    /// Synthetic backends for both networks; no chain is contacted.
    #[cfg(any(test, feature = "simulated"))]
    pub fn simulated() -> Self {
        use crate::blockchain::simulated::SimulatedBackend;

        NetworkId::ALL.into_iter().fold(Self::new(), |registry, network| {
            registry.with_backend(Arc::new(SimulatedBackend::new(network)))
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn NetworkBackend>) -> Self {
        self.backends.insert(backend.network(), backend);
        self
    }

    pub fn get(&self, network: NetworkId) -> Option<Arc<dyn NetworkBackend>> {
        self.backends.get(&network).cloned()
    }

    /// The network whose id format matches `reference`.
    pub fn owner_of(&self, reference: &str) -> Option<NetworkId> {
        NetworkId::ALL
            .into_iter()
            .find(|n| self.backends.get(n).is_some_and(|b| b.is_well_formed(reference)))
    }

    pub fn networks(&self) -> Vec<NetworkId> {
        NetworkId::ALL
            .into_iter()
            .filter(|n| self.backends.contains_key(n))
            .collect()
    }
}

impl std::fmt::Debug for NetworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkRegistry")
            .field("networks", &self.networks())
            .finish()
    }
}
