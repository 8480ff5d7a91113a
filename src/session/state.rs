//! Session lifecycle states and the persisted descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blockchain::types::NetworkId;

/// Current persisted payload version. Other versions are discarded on read.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Session manager state machine.
///
/// ```text
/// Uninitialized → Disconnected → Connecting → Connected
/// Connected → Disconnecting → Disconnected
/// any → Disconnected (network switch)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::Connecting => "connecting",
            SessionPhase::Connected => "connected",
            SessionPhase::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active wallet connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub network: NetworkId,
    pub address: String,
    pub display_name: Option<String>,
    pub connected_at: DateTime<Utc>,
    /// False until the adapter handshake has run in this process.
    #[serde(skip)]
    pub confirmed: bool,
}

impl WalletSession {
    pub fn new(network: NetworkId, address: String, display_name: Option<String>) -> Self {
        Self {
            network,
            address,
            display_name,
            connected_at: Utc::now(),
            confirmed: true,
        }
    }

    /// Whether the session is older than `max_age_secs` (0 = never).
    pub fn is_expired(&self, max_age_secs: u64, now: DateTime<Utc>) -> bool {
        if max_age_secs == 0 {
            return false;
        }
        let age = now.signed_duration_since(self.connected_at).num_seconds();
        age < 0 || age as u64 > max_age_secs
    }
}

/// On-disk form of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    #[serde(flatten)]
    pub session: WalletSession,
}

impl PersistedSession {
    pub fn encode(session: &WalletSession) -> serde_json::Result<String> {
        serde_json::to_string(&PersistedSession {
            version: SESSION_SCHEMA_VERSION,
            session: session.clone(),
        })
    }

    /// Parse a stored payload; `None` for unreadable or foreign versions.
    pub fn decode(raw: &str) -> Option<WalletSession> {
        let persisted: PersistedSession = serde_json::from_str(raw).ok()?;
        (persisted.version == SESSION_SCHEMA_VERSION).then_some(persisted.session)
    }
}
