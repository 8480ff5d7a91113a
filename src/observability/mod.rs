//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Each façade operation runs inside a span carrying an `op_id`,
//! so every event below it is correlated.
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
