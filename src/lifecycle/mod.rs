//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config (already validated) → Metrics exporter → Clients → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight checkouts → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - In-flight checkouts are drained; each runs on its own task, so a dropped
//!   connection or request timeout never cuts a saga between steps

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
