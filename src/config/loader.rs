//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::blockchain::types::NetworkId;
use crate::config::schema::AnchorConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const DEFAULT_NETWORK_ENV_VAR: &str = "REVIEW_ANCHOR_DEFAULT_NETWORK";
pub const PRIMARY_RPC_URL_ENV_VAR: &str = "REVIEW_ANCHOR_PRIMARY_RPC_URL";
pub const SECONDARY_HORIZON_URL_ENV_VAR: &str = "REVIEW_ANCHOR_SECONDARY_HORIZON_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<AnchorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AnchorConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config, |var| std::env::var(var).ok())
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<AnchorConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        finish(AnchorConfig::default(), |var| std::env::var(var).ok())
    }
}

fn finish(
    mut config: AnchorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AnchorConfig, ConfigError> {
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply overrides from `lookup` (normally the process environment).
pub fn apply_env_overrides(
    config: &mut AnchorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let value = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(network) = value(DEFAULT_NETWORK_ENV_VAR) {
        config.session.default_network =
            network.parse::<NetworkId>().map_err(|e| ConfigError::Env {
                var: DEFAULT_NETWORK_ENV_VAR,
                message: e.to_string(),
            })?;
    }
    if let Some(url) = value(PRIMARY_RPC_URL_ENV_VAR) {
        config.primary.rpc_url = url;
    }
    if let Some(url) = value(SECONDARY_HORIZON_URL_ENV_VAR) {
        config.secondary.horizon_url = url;
    }
    Ok(())
}
