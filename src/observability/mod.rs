//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Checkout, downstream clients, lock table, HTTP layer:
//!     → logging.rs (structured tracing events, request-scoped spans)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID is a span field, so every event inside a checkout carries it
//! - Metric updates go through the `metrics` facade; without an installed
//!   recorder they are no-ops, which keeps tests free of global state

pub mod logging;
pub mod metrics;
