//! Checkout orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! CheckoutRequest (validated)
//!     → inventory.rs (lease the product ids, or the global key)
//!     → Product GET → pricing.rs (join, stock check, total)
//!     → Order POST            push CancelOrder
//!     → Product PATCH         push RestoreStock per item
//!     → [per_product: release lease]
//!     → Payment POST
//!     → CheckoutReceipt, or CheckoutError after saga.rs unwinds the stack
//! ```
//!
//! # Design Decisions
//! - Steps run strictly in order; each awaits one downstream call
//! - Prices come only from product snapshots, never from the caller
//! - The inventory lease covers every read-modify-write of stock, so
//!   concurrent checkouts can never oversell
//! - Compensation failures are reported alongside, never instead of, the
//!   error that triggered them

pub mod inventory;
pub mod orchestrator;
pub mod pricing;
pub mod saga;
pub mod types;

use std::fmt;

use thiserror::Error;

use crate::downstream::DownstreamError;

pub use inventory::{InventoryLease, InventoryLocks};
pub use orchestrator::{CheckoutOrchestrator, CheckoutReceipt, CheckoutSettings};
pub use pricing::PricingError;
pub use saga::{Compensation, CompensationReport, CompensationStack};
pub use types::{CheckoutBody, CheckoutRequest, LineItemRequest, PricedCart, ProductSnapshot};

/// Workflow step a checkout was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    FetchProducts,
    Pricing,
    CreateOrder,
    AdjustStock,
    InitiatePayment,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::FetchProducts => "fetch_products",
            Stage::Pricing => "pricing",
            Stage::CreateOrder => "create_order",
            Stage::AdjustStock => "adjust_stock",
            Stage::InitiatePayment => "initiate_payment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkout workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Start,
    ProductsFetched,
    Priced,
    OrderCreated,
    StockAdjusted,
    PaymentInitiated,
    Done,
    Aborted(Stage),
}

impl CheckoutState {
    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: CheckoutState) {
        tracing::debug!(from = ?*self, to = ?next, "Checkout state transition");
        *self = next;
    }
}

/// Errors that end a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request was rejected before the workflow started.
    #[error("invalid checkout request: {0}")]
    InvalidRequest(String),

    /// The cart could not be priced; nothing was mutated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A downstream call failed at `stage`.
    #[error("checkout aborted at {stage}: {source}")]
    Downstream {
        stage: Stage,
        #[source]
        source: DownstreamError,
        /// Present when committed side effects were unwound.
        compensation: Option<CompensationReport>,
    },
}

impl CheckoutError {
    pub fn stage(&self) -> Stage {
        match self {
            CheckoutError::InvalidRequest(_) => Stage::Validate,
            CheckoutError::Pricing(_) => Stage::Pricing,
            CheckoutError::Downstream { stage, .. } => *stage,
        }
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
