//! Configuration loading from disk and environment.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable carrying the payment provider server key.
pub const ENV_PAYMENT_SERVER_KEY: &str = "GATEWAY_PAYMENT_SERVER_KEY";
pub const ENV_PRODUCT_URL: &str = "GATEWAY_PRODUCT_URL";
pub const ENV_ORDER_URL: &str = "GATEWAY_ORDER_URL";
pub const ENV_PAYMENT_URL: &str = "GATEWAY_PAYMENT_URL";
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build a configuration from defaults plus environment overrides.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    finish(GatewayConfig::default())
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_overrides(&mut config, |key| env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    if config.payment.server_key.is_empty() {
        tracing::warn!(
            env = ENV_PAYMENT_SERVER_KEY,
            "Payment server key is empty; payment requests will carry an empty credential"
        );
    }

    Ok(config)
}

/// Apply overrides from a key lookup (the process environment in production).
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(ENV_PAYMENT_SERVER_KEY) {
        config.payment.server_key = key;
    }
    if let Some(url) = lookup(ENV_PRODUCT_URL) {
        config.services.product_url = url;
    }
    if let Some(url) = lookup(ENV_ORDER_URL) {
        config.services.order_url = url;
    }
    if let Some(url) = lookup(ENV_PAYMENT_URL) {
        config.services.payment_url = url;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}
