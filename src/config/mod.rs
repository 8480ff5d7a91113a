//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AnchorConfig (validated, immutable)
//!     → cloned per section into the subsystems that need it
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AnchorConfig, AnchoringConfig, FallbackPolicy, ObservabilityConfig, PrimaryChainConfig,
    RetryConfig, SecondaryChainConfig, SessionConfig,
};
pub use validation::{validate_config, ValidationError};
