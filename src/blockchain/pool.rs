//! Network client pool.
//!
//! # Responsibilities
//! - Build one client handle per network on `initialize()`
//! - Record construction failures as a per-network degraded reason
//! - Hand out shared handles; rebuild one when it is reported unusable
//!
//! No request is sent while building handles, so initialization does not
//! depend on the chains being reachable.

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::aptos::AptosClient;
use crate::blockchain::stellar::HorizonClient;
use crate::blockchain::types::{ChainError, NetworkId};
use crate::config::schema::{AnchorConfig, PrimaryChainConfig, SecondaryChainConfig};
use crate::observability::metrics;

/// Why the pool could not hand out a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("client pool not initialized")]
    NotInitialized,

    #[error("{network} client not ready: {reason}")]
    NotReady { network: NetworkId, reason: String },
}

impl From<PoolError> for ChainError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::NotInitialized => ChainError::NotReady {
                network: NetworkId::default(),
                reason: "client pool not initialized".to_string(),
            },
            PoolError::NotReady { network, reason } => ChainError::NotReady { network, reason },
        }
    }
}

/// A network-specific RPC binding.
#[derive(Debug, Clone)]
pub enum ClientHandle {
    Primary(Arc<AptosClient>),
    Secondary(Arc<HorizonClient>),
}

impl ClientHandle {
    /// Network this handle talks to.
    pub fn network(&self) -> NetworkId {
        match self {
            ClientHandle::Primary(_) => NetworkId::Primary,
            ClientHandle::Secondary(_) => NetworkId::Secondary,
        }
    }
}

/// Readiness of one network, as reported by [`ClientPool::status`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientStatus {
    pub network: NetworkId,
    /// Chain behind the network, e.g. `aptos`.
    pub chain: &'static str,
    pub ready: bool,
    /// First endpoint of a ready handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Lazily built, shared RPC handles for both networks.
///
/// Handles are swapped atomically on rebuild, so callers holding an old
/// `Arc` keep using it until they ask again.
pub struct ClientPool {
    primary_config: PrimaryChainConfig,
    secondary_config: SecondaryChainConfig,
    primary: ArcSwapOption<AptosClient>,
    secondary: ArcSwapOption<HorizonClient>,
    degraded: DashMap<NetworkId, String>,
    initialized: AtomicBool,
}

impl ClientPool {
    /// Empty, uninitialized pool; no handle exists until [`initialize`](Self::initialize).
    pub fn new(primary_config: PrimaryChainConfig, secondary_config: SecondaryChainConfig) -> Self {
        Self {
            primary_config,
            secondary_config,
            primary: ArcSwapOption::empty(),
            secondary: ArcSwapOption::empty(),
            degraded: DashMap::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Pool for the chain sections of `config`.
    pub fn from_config(config: &AnchorConfig) -> Self {
        Self::new(config.primary.clone(), config.secondary.clone())
    }

    /// Build every handle. Never fails; failures leave the network degraded.
    pub fn initialize(&self) {
        for network in NetworkId::ALL {
            self.rebuild(network);
        }
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(
            degraded = self.degraded.len(),
            "Client pool initialized"
        );
    }

    /// Re-create the handle for one network.
    ///
    /// Returns `true` if the network is ready afterwards.
    pub fn rebuild(&self, network: NetworkId) -> bool {
        let result = match network {
            NetworkId::Primary => AptosClient::new(self.primary_config.clone()).map(|c| {
                self.primary.store(Some(Arc::new(c)));
            }),
            NetworkId::Secondary => HorizonClient::new(self.secondary_config.clone()).map(|c| {
                self.secondary.store(Some(Arc::new(c)));
            }),
        };

        let ready = match result {
            Ok(()) => {
                self.degraded.remove(&network);
                tracing::debug!(network = %network, chain = network.chain_name(), "Client handle ready");
                true
            }
            Err(e) => {
                tracing::warn!(
                    network = %network,
                    chain = network.chain_name(),
                    error = %e,
                    "Client handle unavailable"
                );
                match network {
                    NetworkId::Primary => self.primary.store(None),
                    NetworkId::Secondary => self.secondary.store(None),
                }
                self.degraded.insert(network, e.to_string());
                false
            }
        };
        metrics::record_client_ready(network, ready);
        ready
    }

    /// Whether [`initialize`](Self::initialize) has run, even if a network is degraded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Handle for `network`.
    ///
    /// Fails with [`PoolError::NotInitialized`] before `initialize` and with
    /// [`PoolError::NotReady`] while the network is degraded.
    pub fn get_client(&self, network: NetworkId) -> Result<ClientHandle, PoolError> {
        match network {
            NetworkId::Primary => self.aptos().map(ClientHandle::Primary),
            NetworkId::Secondary => self.horizon().map(ClientHandle::Secondary),
        }
    }

    /// Typed handle for the primary network.
    pub fn aptos(&self) -> Result<Arc<AptosClient>, PoolError> {
        self.ready_check(NetworkId::Primary)?;
        self.primary
            .load_full()
            .ok_or_else(|| self.not_ready(NetworkId::Primary))
    }

    /// Typed handle for the secondary network.
    pub fn horizon(&self) -> Result<Arc<HorizonClient>, PoolError> {
        self.ready_check(NetworkId::Secondary)?;
        self.secondary
            .load_full()
            .ok_or_else(|| self.not_ready(NetworkId::Secondary))
    }

    /// Readiness of every network, in [`NetworkId::ALL`] order.
    pub fn status(&self) -> Vec<ClientStatus> {
        NetworkId::ALL
            .into_iter()
            .map(|network| {
                let reason = if !self.is_initialized() {
                    Some("not initialized".to_string())
                } else {
                    self.degraded.get(&network).map(|r| r.value().clone())
                };
                let endpoint = match self.get_client(network) {
                    Ok(ClientHandle::Primary(client)) => Some(client.endpoint().to_string()),
                    Ok(ClientHandle::Secondary(client)) => Some(client.endpoint().to_string()),
                    Err(_) => None,
                };
                ClientStatus {
                    network,
                    chain: network.chain_name(),
                    ready: reason.is_none(),
                    endpoint,
                    reason,
                }
            })
            .collect()
    }

    fn ready_check(&self, network: NetworkId) -> Result<(), PoolError> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized);
        }
        match self.degraded.get(&network) {
            Some(reason) => Err(PoolError::NotReady {
                network,
                reason: reason.value().clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_ready(&self, network: NetworkId) -> PoolError {
        PoolError::NotReady {
            network,
            reason: "client handle missing".to_string(),
        }
    }
}

impl std::fmt::Debug for ClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("initialized", &self.is_initialized())
            .field("degraded", &self.degraded.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_pool_refuses_clients() {
        let pool = ClientPool::new(PrimaryChainConfig::default(), SecondaryChainConfig::default());
        assert!(!pool.is_initialized());
        assert_eq!(pool.get_client(NetworkId::Primary).unwrap_err(), PoolError::NotInitialized);
        assert!(pool.status().iter().all(|s| !s.ready));
    }

    #[test]
    fn test_initialize_builds_both_handles() {
        let pool = ClientPool::new(PrimaryChainConfig::default(), SecondaryChainConfig::default());
        pool.initialize();

        assert!(pool.is_initialized());
        assert_eq!(pool.get_client(NetworkId::Primary).unwrap().network(), NetworkId::Primary);
        assert_eq!(pool.get_client(NetworkId::Secondary).unwrap().network(), NetworkId::Secondary);
        assert!(pool.status().iter().all(|s| s.ready));
    }

    #[test]
    fn test_status_reports_chain_and_endpoint() {
        let primary = PrimaryChainConfig {
            rpc_url: "not a url".to_string(),
            ..PrimaryChainConfig::default()
        };
        let secondary = SecondaryChainConfig::default();
        let horizon_url = secondary.horizon_url.clone();
        let pool = ClientPool::new(primary, secondary);
        pool.initialize();

        let status = pool.status();
        assert_eq!(status[0].chain, "aptos");
        assert!(!status[0].ready);
        assert_eq!(status[0].endpoint, None);
        assert!(status[0].reason.is_some());

        assert_eq!(status[1].chain, "stellar");
        assert!(status[1].ready);
        let endpoint = status[1].endpoint.as_deref().unwrap();
        assert!(endpoint.starts_with(horizon_url.trim_end_matches('/')));
    }

    #[test]
    fn test_bad_endpoint_degrades_only_that_network() {
        let primary = PrimaryChainConfig {
            rpc_url: "not a url".to_string(),
            ..PrimaryChainConfig::default()
        };
        let pool = ClientPool::new(primary, SecondaryChainConfig::default());
        pool.initialize();

        assert!(pool.is_initialized());
        assert!(matches!(
            pool.get_client(NetworkId::Primary),
            Err(PoolError::NotReady { network: NetworkId::Primary, .. })
        ));
        assert!(pool.horizon().is_ok());
        assert!(!pool.rebuild(NetworkId::Primary));
    }

    #[test]
    fn test_rebuild_replaces_handle() {
        let pool = ClientPool::new(PrimaryChainConfig::default(), SecondaryChainConfig::default());
        pool.initialize();
        let before = pool.aptos().unwrap();
        assert!(pool.rebuild(NetworkId::Primary));
        let after = pool.aptos().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
