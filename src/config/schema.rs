//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the checkout gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Base URLs of the downstream services.
    pub services: ServicesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Payment authorization settings.
    pub payment: PaymentConfig,

    /// Checkout orchestration policy.
    pub checkout: CheckoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream service base URLs.
///
/// Paths (`/products`, `/order/create`, `/payments`, ...) are appended by the
/// typed clients, so a base URL may carry a prefix such as `/api`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub product_url: String,
    pub order_url: String,
    pub payment_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            product_url: "http://127.0.0.1:9991/api".to_string(),
            order_url: "http://127.0.0.1:9993".to_string(),
            payment_url: "http://127.0.0.1:9995/api".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Downstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one downstream call in seconds.
    pub downstream_secs: u64,

    /// Inbound request timeout in seconds. Must cover a full checkout,
    /// including any time spent waiting on inventory leases.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            downstream_secs: 15,
            request_secs: 120,
        }
    }
}

/// Payment authorization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Payment provider server key. Normally supplied through
    /// `GATEWAY_PAYMENT_SERVER_KEY` rather than the config file.
    pub server_key: String,

    /// Payment type sent with every payment intent.
    pub payment_type: String,

    /// Bank used when the caller does not pick one.
    pub default_bank: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            server_key: String::new(),
            payment_type: "bank_transfer".to_string(),
            default_bank: "bca".to_string(),
        }
    }
}

/// How concurrent checkouts are serialized against shared inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SerializationMode {
    /// Lease each product id from fetch until the stock decrement lands.
    #[default]
    PerProduct,
    /// One process-wide lease held for the whole checkout.
    Global,
}

/// Checkout orchestration policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub serialization: SerializationMode,

    /// Unwind committed steps (cancel order, restore stock) when a later
    /// step fails.
    pub compensation: bool,

    /// Status written to newly created orders.
    pub initial_order_status: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            serialization: SerializationMode::PerProduct,
            compensation: true,
            initial_order_status: "Pending".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
