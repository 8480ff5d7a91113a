//! Wallet connection and record anchoring on Aptos and Stellar.

pub mod anchor;
pub mod blockchain;
pub mod config;
pub mod context;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod verification;

pub use blockchain::types::{AnchorReference, AnchorStatus, NetworkId, RecordKind};
pub use config::schema::AnchorConfig;
pub use context::{AnchorContext, ContextSnapshot};
pub use error::{AnchorError, AnchorResult};
