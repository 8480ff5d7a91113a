//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. All errors are collected
//! rather than stopping at the first.

use std::fmt;

use crate::config::schema::{AnchorConfig, FallbackPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// True when the `simulated` fallback can be honored by this build.
pub const fn simulated_available() -> bool {
    cfg!(any(test, feature = "simulated"))
}

pub fn validate_config(config: &AnchorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "primary.rpc_url", &config.primary.rpc_url);
    for (i, u) in config.primary.failover_urls.iter().enumerate() {
        check_url(&mut errors, &format!("primary.failover_urls[{}]", i), u);
    }
    check_url(&mut errors, "secondary.horizon_url", &config.secondary.horizon_url);
    for (i, u) in config.secondary.failover_urls.iter().enumerate() {
        check_url(&mut errors, &format!("secondary.failover_urls[{}]", i), u);
    }

    for (field, value) in [
        ("primary.rpc_timeout_secs", config.primary.rpc_timeout_secs),
        ("primary.submit_timeout_secs", config.primary.submit_timeout_secs),
        ("primary.confirmation_timeout_secs", config.primary.confirmation_timeout_secs),
        ("primary.confirmation_poll_ms", config.primary.confirmation_poll_ms),
        ("primary.max_gas_amount", config.primary.max_gas_amount),
        ("primary.tx_expiration_secs", config.primary.tx_expiration_secs),
        ("secondary.rpc_timeout_secs", config.secondary.rpc_timeout_secs),
        ("secondary.tx_timeout_secs", config.secondary.tx_timeout_secs),
        ("session.connect_timeout_secs", config.session.connect_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if let Some(address) = &config.primary.registry_address {
        if !is_account_address(address) {
            errors.push(ValidationError::new(
                "primary.registry_address",
                format!("'{}' is not a 0x-prefixed hex account address", address),
            ));
        }
    }
    for (field, ident) in [
        ("primary.registry_module", &config.primary.registry_module),
        ("primary.registry_function", &config.primary.registry_function),
    ] {
        if !is_identifier(ident) {
            errors.push(ValidationError::new(field, format!("'{}' is not a Move identifier", ident)));
        }
    }

    if config.secondary.network_passphrase.trim().is_empty() {
        errors.push(ValidationError::new("secondary.network_passphrase", "must not be empty"));
    }
    if config.secondary.base_fee == 0 {
        errors.push(ValidationError::new("secondary.base_fee", "must be greater than 0"));
    }

    if config.session.store_path.trim().is_empty() {
        errors.push(ValidationError::new("session.store_path", "must not be empty"));
    }

    if config.anchoring.fallback == FallbackPolicy::Simulated && !simulated_available() {
        errors.push(ValidationError::new(
            "anchoring.fallback",
            "'simulated' requires building with the `simulated` feature",
        ));
    }

    if config.retries.enabled && config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if !matches!(
        config.observability.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        Ok(u) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

fn is_account_address(s: &str) -> bool {
    s.strip_prefix("0x")
        .map(|h| !h.is_empty() && h.len() <= 64 && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AnchorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AnchorConfig::default();
        config.primary.rpc_url = "not a url".to_string();
        config.primary.rpc_timeout_secs = 0;
        config.primary.registry_address = Some("registry".to_string());
        config.secondary.horizon_url = "ftp://horizon".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(errors.len(), 4);
        assert!(fields.contains(&"primary.rpc_url"));
        assert!(fields.contains(&"primary.rpc_timeout_secs"));
        assert!(fields.contains(&"primary.registry_address"));
        assert!(fields.contains(&"secondary.horizon_url"));
    }

    #[test]
    fn test_registry_identifiers() {
        let mut config = AnchorConfig::default();
        config.primary.registry_address = Some("0xfeed".to_string());
        config.primary.registry_module = "1bad".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "primary.registry_module");
    }

    #[test]
    fn test_simulated_allowed_in_tests() {
        let mut config = AnchorConfig::default();
        config.anchoring.fallback = FallbackPolicy::Simulated;
        assert!(validate_config(&config).is_ok());
    }
}
