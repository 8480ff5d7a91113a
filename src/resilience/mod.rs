//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Chain call:
//!     → guard.rs (serialize operations per network)
//!     → timeouts.rs (bound every RPC)
//!     → On failure, reads only: retries.rs (retry with backoff.rs delays)
//! ```

pub mod backoff;
pub mod guard;
pub mod retries;
pub mod timeouts;

pub use guard::KeyedMutex;
pub use retries::retry_read;
pub use timeouts::with_timeout;
