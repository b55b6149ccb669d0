//! Checkout gateway library.
//!
//! An API gateway that turns a cart into a priced order, a stock decrement
//! and an initiated payment across independent Product, Order and Payment
//! services.

pub mod checkout;
pub mod config;
pub mod downstream;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use checkout::CheckoutOrchestrator;
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
