//! Wallet session manager.
//!
//! # Responsibilities
//! - Track the active network and the (at most one) wallet session
//! - Connect and disconnect through the network's wallet adapter
//! - Persist the session descriptor and the network choice
//! - Restore a persisted session at startup, unconfirmed until the adapter
//!   handshake runs again
//!
//! The session slot is a synchronous lock and is never held across an
//! `.await`. Operations on one network are serialized by a keyed mutex.

pub mod state;
pub mod store;

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

use crate::blockchain::pool::ClientPool;
use crate::blockchain::types::NetworkId;
use crate::blockchain::wallet::WalletAdapter;
use crate::config::schema::SessionConfig;
use crate::error::{AnchorError, AnchorResult};
use crate::observability::metrics;
use crate::resilience::KeyedMutex;

pub use state::{PersistedSession, SessionPhase, WalletSession, SESSION_SCHEMA_VERSION};
pub use store::{
    session_key, FileStore, KeyValueStore, MemoryStore, StoreError, ACTIVE_NETWORK_KEY,
};

#[derive(Debug)]
struct SessionSlot {
    network: NetworkId,
    phase: SessionPhase,
    session: Option<WalletSession>,
}

/// Owns the wallet session of the active network.
///
/// Multi-step transitions serialize on a per-network lock; the slot itself
/// is only ever held for a read or a write, never across an await.
pub struct SessionManager {
    pool: Arc<ClientPool>,
    wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>>,
    store: Arc<dyn KeyValueStore>,
    config: SessionConfig,
    slot: RwLock<SessionSlot>,
    locks: KeyedMutex<NetworkId>,
}

impl SessionManager {
    /// Manager starting on the configured default network, uninitialized
    /// until [`rehydrate`](Self::rehydrate) runs.
    pub fn new(
        pool: Arc<ClientPool>,
        wallets: HashMap<NetworkId, Arc<dyn WalletAdapter>>,
        store: Arc<dyn KeyValueStore>,
        config: SessionConfig,
    ) -> Self {
        let network = config.default_network;
        Self {
            pool,
            wallets,
            store,
            config,
            slot: RwLock::new(SessionSlot {
                network,
                phase: SessionPhase::Uninitialized,
                session: None,
            }),
            locks: KeyedMutex::new(),
        }
    }

    /// Restore the persisted network choice and session.
    ///
    /// Expired, unreadable or mismatched payloads are dropped from the store.
    pub fn rehydrate(&self) {
        let network = match self.store.get(ACTIVE_NETWORK_KEY) {
            Ok(Some(raw)) => raw.parse::<NetworkId>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring persisted network choice");
                self.config.default_network
            }),
            Ok(None) => self.config.default_network,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted network choice");
                self.config.default_network
            }
        };

        let key = session_key(network);
        let session = match self.store.get(&key) {
            Ok(Some(raw)) => match PersistedSession::decode(&raw) {
                Some(s) if s.network != network => {
                    tracing::warn!(stored = %s.network, expected = %network, "Discarding session for another network");
                    self.forget(&key);
                    None
                }
                Some(s) if s.is_expired(self.config.max_age_secs, Utc::now()) => {
                    tracing::info!(
                        network = %network,
                        connected_at = %s.connected_at,
                        "Persisted session expired"
                    );
                    self.forget(&key);
                    None
                }
                Some(s) => Some(s),
                None => {
                    tracing::warn!(network = %network, "Discarding unreadable persisted session");
                    self.forget(&key);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session");
                None
            }
        };

        let mut slot = self.write();
        slot.network = network;
        slot.phase = if session.is_some() {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        };
        if let Some(s) = &session {
            tracing::info!(network = %network, address = %s.address, "Session restored, awaiting confirmation");
        }
        slot.session = session;
        metrics::record_session_transition(network, slot.phase.as_str());
    }

    /// The active network.
    pub fn network(&self) -> NetworkId {
        self.read().network
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase
    }

    /// The session record, including one restored but not yet confirmed.
    pub fn session(&self) -> Option<WalletSession> {
        self.read().session.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.phase() == SessionPhase::Connected
    }

    /// Connected address; `None` unless the phase is `Connected`.
    pub fn address(&self) -> Option<String> {
        let slot = self.read();
        match slot.phase {
            SessionPhase::Connected => slot.session.as_ref().map(|s| s.address.clone()),
            _ => None,
        }
    }

    /// Label of the active network's wallet adapter.
    pub fn wallet_name(&self) -> Option<String> {
        self.wallet(self.network()).map(|w| w.label().to_string())
    }

    /// Adapter registered for `network`, if any.
    pub fn wallet(&self, network: NetworkId) -> Option<Arc<dyn WalletAdapter>> {
        self.wallets.get(&network).cloned()
    }

    /// Exclusive access to `network` for a multi-step operation.
    pub async fn lock(&self, network: NetworkId) -> OwnedMutexGuard<()> {
        self.locks.lock(&network).await
    }

    /// Lock the active network, returning it with the guard.
    ///
    /// The active network only changes while every network lock is held,
    /// so it is re-read after acquiring and stays fixed while the guard
    /// lives.
    pub async fn lock_active(&self) -> (NetworkId, OwnedMutexGuard<()>) {
        loop {
            let network = self.network();
            let guard = self.lock(network).await;
            if self.network() == network {
                return (network, guard);
            }
            tracing::debug!(stale = %network, "Active network changed while waiting, retrying");
        }
    }

    /// Connect the active network's wallet and return the address.
    pub async fn connect(&self) -> AnchorResult<String> {
        let (network, _guard) = self.lock_active().await;

        {
            let mut slot = self.write();
            if slot.phase == SessionPhase::Connected {
                if let Some(s) = slot.session.as_ref().filter(|s| s.confirmed) {
                    return Ok(s.address.clone());
                }
            }
            if !self.pool.is_initialized() {
                if slot.phase == SessionPhase::Uninitialized {
                    slot.phase = SessionPhase::Disconnected;
                }
                return Err(AnchorError::NotInitialized);
            }
            if slot.phase != SessionPhase::Connected {
                slot.phase = SessionPhase::Connecting;
            }
        }
        metrics::record_session_transition(network, SessionPhase::Connecting.as_str());

        self.handshake(network).await.map(|s| s.address)
    }

    /// The current session, re-running the adapter handshake first if it
    /// was restored from storage.
    ///
    /// Callers must hold the network lock.
    pub async fn ensure_confirmed(&self) -> AnchorResult<WalletSession> {
        let session = match (self.phase(), self.session()) {
            (SessionPhase::Connected, Some(s)) => s,
            _ => return Err(AnchorError::NotConnected),
        };
        if session.confirmed {
            return Ok(session);
        }
        tracing::debug!(network = %session.network, "Confirming restored session");
        self.handshake(session.network).await
    }

    /// Disconnect the active network. Never fails; always ends disconnected.
    pub async fn disconnect(&self) {
        let (network, _guard) = self.lock_active().await;
        self.teardown(network).await;
    }

    /// Tear down the current session and make `target` the active network.
    ///
    /// Holds every network lock, in [`NetworkId::ALL`] order, for the whole
    /// transition.
    pub async fn switch_network(&self, target: NetworkId) {
        let mut guards = Vec::with_capacity(NetworkId::ALL.len());
        for network in NetworkId::ALL {
            guards.push(self.lock(network).await);
        }

        let current = self.network();
        self.teardown(current).await;
        {
            let mut slot = self.write();
            slot.network = target;
            slot.phase = SessionPhase::Disconnected;
            slot.session = None;
        }
        if let Err(e) = self.store.set(ACTIVE_NETWORK_KEY, target.as_str()) {
            tracing::warn!(error = %e, "Failed to persist network choice");
        }
        tracing::info!(from = %current, to = %target, "Switched network");
    }

    async fn handshake(&self, network: NetworkId) -> AnchorResult<WalletSession> {
        let Some(wallet) = self.wallet(network) else {
            self.clear_session(network);
            return Err(AnchorError::ConnectionFailed(format!(
                "no wallet available for the {} network",
                network
            )));
        };

        let secs = self.config.connect_timeout_secs;
        let outcome = match tokio::time::timeout(Duration::from_secs(secs), wallet.connect()).await {
            Ok(Ok(address)) => Ok(address),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("wallet handshake timed out after {} seconds", secs)),
        };

        match outcome {
            Ok(address) => {
                let previous = self.session().filter(|s| s.network == network);
                let session = match previous {
                    Some(prev) if prev.address == address => WalletSession {
                        confirmed: true,
                        display_name: Some(wallet.label().to_string()),
                        ..prev
                    },
                    Some(prev) => {
                        tracing::warn!(
                            stored = %prev.address,
                            actual = %address,
                            "Wallet address changed, replacing session"
                        );
                        WalletSession::new(network, address, Some(wallet.label().to_string()))
                    }
                    None => WalletSession::new(network, address, Some(wallet.label().to_string())),
                };

                self.persist(&session);
                {
                    let mut slot = self.write();
                    slot.phase = SessionPhase::Connected;
                    slot.session = Some(session.clone());
                }
                metrics::record_session_transition(network, SessionPhase::Connected.as_str());
                tracing::info!(network = %network, address = %session.address, "Wallet connected");
                Ok(session)
            }
            Err(cause) => {
                tracing::warn!(network = %network, error = %cause, "Wallet connection failed");
                match tokio::time::timeout(Duration::from_secs(secs), wallet.disconnect()).await {
                    Ok(Err(e)) => tracing::debug!(error = %e, "Adapter teardown after failed handshake"),
                    Err(_) => tracing::debug!("Adapter teardown after failed handshake timed out"),
                    Ok(Ok(())) => {}
                }
                self.clear_session(network);
                Err(AnchorError::ConnectionFailed(cause))
            }
        }
    }

    async fn teardown(&self, network: NetworkId) {
        {
            let mut slot = self.write();
            if slot.phase == SessionPhase::Connected {
                slot.phase = SessionPhase::Disconnecting;
            }
        }

        if let Some(wallet) = self.wallet(network) {
            let secs = self.config.connect_timeout_secs;
            match tokio::time::timeout(Duration::from_secs(secs), wallet.disconnect()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(network = %network, error = %e, "Wallet disconnect failed"),
                Err(_) => tracing::warn!(network = %network, "Wallet disconnect timed out"),
            }
        }

        self.clear_session(network);
        tracing::info!(network = %network, "Wallet disconnected");
    }

    fn clear_session(&self, network: NetworkId) {
        self.forget(&session_key(network));
        let mut slot = self.write();
        slot.phase = SessionPhase::Disconnected;
        slot.session = None;
        metrics::record_session_transition(network, SessionPhase::Disconnected.as_str());
    }

    fn persist(&self, session: &WalletSession) {
        let result = PersistedSession::encode(session)
            .map_err(StoreError::from)
            .and_then(|raw| self.store.set(&session_key(session.network), &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist wallet session");
        }
    }

    fn forget(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key = %key, error = %e, "Failed to clear persisted state");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSlot> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSlot> {
        self.slot.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.read();
        f.debug_struct("SessionManager")
            .field("network", &slot.network)
            .field("phase", &slot.phase)
            .field("address", &slot.session.as_ref().map(|s| &s.address))
            .finish()
    }
}
