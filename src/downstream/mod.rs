//! Downstream service clients.
//!
//! # Data Flow
//! ```text
//! Typed call (product.rs / order.rs / payment.rs)
//!     → client.rs (spawn one task per call, await its oneshot result)
//!     → CallResult { status, body, transport_error }
//!     → typed client checks the expected status and decodes the body
//!     → Result<T, DownstreamError>
//! ```
//!
//! # Design Decisions
//! - HTTP 4xx/5xx are data, not transport errors; the raw body travels with
//!   the status so the gateway can forward it verbatim
//! - Every call has a connect and total deadline
//! - No retries: every downstream call is non-idempotent or part of a
//!   workflow that the caller restarts from scratch

pub mod client;
pub mod order;
pub mod payment;
pub mod product;

use axum::body::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{ServicesConfig, TimeoutConfig};

pub use client::{CallResult, DownstreamClient, Service};
pub use order::OrderClient;
pub use payment::PaymentClient;
pub use product::ProductClient;

/// Errors surfaced by the typed downstream clients.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Connection failure, timeout or unreadable response.
    #[error("{service} service unreachable: {message}")]
    Transport { service: Service, message: String },

    /// The service answered with a status other than the one expected.
    #[error("{service} service answered {status}")]
    Rejected {
        service: Service,
        status: StatusCode,
        body: Bytes,
    },

    /// The expected status arrived but the body could not be decoded.
    #[error("{service} service returned an undecodable body: {message}")]
    Decode { service: Service, message: String },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type for downstream operations.
pub type DownstreamResult<T> = Result<T, DownstreamError>;

/// The three downstream clients used by checkout and the pass-through routes.
#[derive(Clone)]
pub struct ServiceClients {
    pub product: ProductClient,
    pub order: OrderClient,
    pub payment: PaymentClient,
}

impl ServiceClients {
    /// Build all clients over one shared connection pool.
    pub fn new(services: &ServicesConfig, timeouts: &TimeoutConfig) -> DownstreamResult<Self> {
        let http = client::build_http_client(timeouts)?;
        Ok(Self {
            product: ProductClient::new(DownstreamClient::new(
                http.clone(),
                Service::Product,
                &services.product_url,
            )),
            order: OrderClient::new(DownstreamClient::new(
                http.clone(),
                Service::Order,
                &services.order_url,
            )),
            payment: PaymentClient::new(DownstreamClient::new(
                http,
                Service::Payment,
                &services.payment_url,
            )),
        })
    }

    /// Copies of the clients that stamp `request_id` on every call.
    pub fn with_request_id(&self, request_id: Option<&str>) -> Self {
        match request_id {
            Some(id) => Self {
                product: self.product.with_request_id(id),
                order: self.order.with_request_id(id),
                payment: self.payment.with_request_id(id),
            },
            None => self.clone(),
        }
    }
}
