//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so an empty file is a valid config.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::NetworkId;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnchorConfig {
    /// Primary chain (Aptos) settings.
    pub primary: PrimaryChainConfig,

    /// Secondary chain (Stellar) settings.
    pub secondary: SecondaryChainConfig,

    /// Wallet session settings.
    pub session: SessionConfig,

    /// Anchoring behavior.
    pub anchoring: AnchoringConfig,

    /// Retry configuration for read-only queries.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Primary chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrimaryChainConfig {
    /// Fullnode REST endpoint, including the `/v1` prefix.
    pub rpc_url: String,

    /// Failover fullnode endpoints.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Bound on signing plus submission, in seconds.
    pub submit_timeout_secs: u64,

    /// How long to wait for a submitted transaction to commit.
    pub confirmation_timeout_secs: u64,

    /// Polling interval while waiting for commit, in milliseconds.
    pub confirmation_poll_ms: u64,

    /// Gas ceiling per transaction, in gas units.
    pub max_gas_amount: u64,

    /// Gas unit price in octas.
    pub gas_unit_price: u64,

    /// Transaction expiration, in seconds from build time.
    pub tx_expiration_secs: u64,

    /// Account publishing the record registry module. Unset means every
    /// record goes through the liveness transfer.
    pub registry_address: Option<String>,

    /// Module name under `registry_address`.
    pub registry_module: String,

    /// Entry function taking the record kind and content hash.
    pub registry_function: String,
}

impl Default for PrimaryChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://fullnode.testnet.aptoslabs.com/v1".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            submit_timeout_secs: 30,
            confirmation_timeout_secs: 30,
            confirmation_poll_ms: 1000,
            max_gas_amount: 2000,
            gas_unit_price: 100,
            tx_expiration_secs: 600,
            registry_address: None,
            registry_module: "review_registry".to_string(),
            registry_function: "anchor_record".to_string(),
        }
    }
}

/// Secondary chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecondaryChainConfig {
    /// Horizon endpoint.
    pub horizon_url: String,

    /// Failover Horizon endpoints, tried in order.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Network passphrase the transaction hash is bound to.
    pub network_passphrase: String,

    /// Fee per operation in stroops.
    pub base_fee: u32,

    /// Upper time bound of built transactions, in seconds from build time.
    pub tx_timeout_secs: u64,
}

impl Default for SecondaryChainConfig {
    fn default() -> Self {
        Self {
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            base_fee: 100,
            tx_timeout_secs: 30,
        }
    }
}

/// Wallet session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Network selected when no choice has been persisted.
    pub default_network: NetworkId,

    /// State file holding the persisted session and network choice.
    pub store_path: String,

    /// Maximum age of a rehydrated session in seconds (0 = no expiry).
    pub max_age_secs: u64,

    /// Bound on the wallet connection handshake, and on adapter teardown,
    /// in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_network: NetworkId::Primary,
            store_path: ".review-anchor/state.json".to_string(),
            max_age_secs: 86_400,
            connect_timeout_secs: 30,
        }
    }
}

/// What happens when every real anchoring or lookup path fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Surface the failure as a typed error.
    #[default]
    Strict,
    /// Return a synthesized reference flagged `synthetic`.
    /// Requires the `simulated` feature.
    Simulated,
}

/// Anchoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnchoringConfig {
    /// Behaviour when no chain path succeeds.
    pub fallback: FallbackPolicy,

    /// File holding last-known references across runs. Unset keeps them in
    /// memory only.
    pub cache_path: Option<String>,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Colored output.
    pub ansi: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}
