//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (hex seeds) → wallet adapters (aptos/, stellar/)
//! Config (RPC URLs)       → pool.rs (one client handle per network)
//!
//! backend.rs: NetworkRegistry
//!     → aptos::AptosBackend   (sign, submit, confirm via fullnode REST)
//!     → stellar::StellarBackend (build + hash MANAGE_DATA tx, Horizon reads)
//! ```
//!
//! # Security Constraints
//! - Private keys only from environment variables
//! - Never log private keys
//! - Every RPC call is bounded by a configured timeout

pub mod aptos;
pub mod backend;
pub mod pool;
pub mod rest;
#[cfg(any(test, feature = "simulated"))]
pub mod simulated;
pub mod stellar;
pub mod types;
pub mod wallet;

pub use backend::{NetworkBackend, NetworkRegistry};
pub use pool::{ClientHandle, ClientPool, ClientStatus, PoolError};
pub use types::{AnchorReference, AnchorStatus, ChainError, ChainResult, NetworkId, RecordKind};
pub use wallet::{WalletAdapter, WalletError};
