//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check downstream URLs are absolute http(s) URLs
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid service URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("timeouts.request_secs ({request}) must exceed timeouts.downstream_secs ({downstream})")]
    RequestTimeoutTooShort { request: u64, downstream: u64 },

    #[error("observability.log_format: unknown format '{0}' (expected pretty or json)")]
    UnknownLogFormat(String),

    #[error("payment.payment_type must not be empty")]
    EmptyPaymentType,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    for (field, value) in [
        ("services.product_url", &config.services.product_url),
        ("services.order_url", &config.services.order_url),
        ("services.payment_url", &config.services.payment_url),
    ] {
        if !is_service_url(value) {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.downstream_secs", timeouts.downstream_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }
    if timeouts.request_secs > 0 && timeouts.request_secs <= timeouts.downstream_secs {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: timeouts.request_secs,
            downstream: timeouts.downstream_secs,
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "security.max_body_size",
        });
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::UnknownLogFormat(other.to_string())),
    }

    if config.payment.payment_type.trim().is_empty() {
        errors.push(ValidationError::EmptyPaymentType);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_service_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}
