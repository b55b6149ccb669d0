//! Checkout orchestrator.
//!
//! Runs the fixed step sequence for one checkout attempt and owns its
//! serialization and compensation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;

use crate::checkout::inventory::{InventoryLease, InventoryLocks, GLOBAL_KEY};
use crate::checkout::pricing;
use crate::checkout::saga::{Compensation, CompensationStack};
use crate::checkout::types::{BankTransfer, CheckoutRequest};
use crate::checkout::{CheckoutError, CheckoutResult, CheckoutState, Stage};
use crate::config::{GatewayConfig, PaymentConfig, SerializationMode};
use crate::downstream::order::CreateOrderPayload;
use crate::downstream::payment::{basic_auth_header, PaymentIntent, PaymentReceipt, TransactionDetails};
use crate::downstream::{DownstreamError, ServiceClients};
use crate::observability::metrics;

/// Checkout behaviour taken from configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub serialization: SerializationMode,
    pub compensation: bool,
    pub initial_order_status: String,
    pub payment: PaymentConfig,
}

impl From<&GatewayConfig> for CheckoutSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            serialization: config.checkout.serialization,
            compensation: config.checkout.compensation,
            initial_order_status: config.checkout.initial_order_status.clone(),
            payment: config.payment.clone(),
        }
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub total: f64,
    pub payment: PaymentReceipt,
}

/// Sequences product, order and payment calls for checkouts.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    clients: ServiceClients,
    locks: InventoryLocks,
    settings: Arc<CheckoutSettings>,
}

impl CheckoutOrchestrator {
    pub fn new(clients: ServiceClients, settings: CheckoutSettings) -> Self {
        Self {
            clients,
            locks: InventoryLocks::new(),
            settings: Arc::new(settings),
        }
    }

    pub fn locks(&self) -> &InventoryLocks {
        &self.locks
    }

    /// Run one checkout attempt to completion or abort.
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        request_id: Option<&str>,
    ) -> CheckoutResult<CheckoutReceipt> {
        let start = Instant::now();
        let span = tracing::info_span!(
            "checkout",
            request_id = request_id.unwrap_or("-"),
            user_id = %request.user_id,
            items = request.items.len(),
        );

        let result = async {
            request.validate()?;
            self.run(&request, request_id).await
        }
        .instrument(span.clone())
        .await;

        let _entered = span.enter();
        match &result {
            Ok(receipt) => {
                metrics::record_checkout("success", "done", start);
                tracing::info!(
                    order_id = %receipt.order_id,
                    total = receipt.total,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Checkout completed"
                );
            }
            Err(e) => {
                metrics::record_checkout("failure", e.stage().as_str(), start);
                tracing::warn!(stage = %e.stage(), error = %e, "Checkout aborted");
            }
        }
        result
    }

    async fn run(
        &self,
        request: &CheckoutRequest,
        request_id: Option<&str>,
    ) -> CheckoutResult<CheckoutReceipt> {
        let clients = self.clients.with_request_id(request_id);
        let lock_keys = self.lock_keys(request);
        let mut lease: Option<InventoryLease> = Some(self.locks.acquire(lock_keys.iter().cloned()).await);
        let mut saga = CompensationStack::default();
        let mut state = CheckoutState::Start;

        let product_ids = request.product_ids();
        let snapshots = match clients
            .product
            .fetch_products(&product_ids, request.effective_limit())
            .await
        {
            Ok(snapshots) => snapshots,
            Err(source) => {
                state.advance(CheckoutState::Aborted(Stage::FetchProducts));
                return Err(CheckoutError::Downstream {
                    stage: Stage::FetchProducts,
                    source,
                    compensation: None,
                });
            }
        };
        state.advance(CheckoutState::ProductsFetched);

        let cart = pricing::price(&request.items, &snapshots).inspect_err(|_| {
            state.advance(CheckoutState::Aborted(Stage::Pricing));
        })?;
        state.advance(CheckoutState::Priced);

        let payload = CreateOrderPayload {
            user_id: request.user_id,
            payment_type_id: request.payment_type_id,
            order_number: request.order_number.as_deref(),
            total_price: cart.total,
            product_order: &cart.items,
            status: &self.settings.initial_order_status,
            is_paid: false,
            ref_code: request.ref_code.as_deref(),
            created_at: Utc::now(),
        };
        let order_id = match clients.order.create_order(&payload).await {
            Ok(order_id) => order_id,
            Err(source) => {
                state.advance(CheckoutState::Aborted(Stage::CreateOrder));
                return Err(CheckoutError::Downstream {
                    stage: Stage::CreateOrder,
                    source,
                    compensation: None,
                });
            }
        };
        saga.push(Compensation::CancelOrder {
            user_id: request.user_id,
            order_id: order_id.clone(),
        });
        state.advance(CheckoutState::OrderCreated);
        tracing::debug!(order_id = %order_id, "Order created");

        if let Err(source) = clients.product.update_stocks(&cart.stock_adjustments()).await {
            state.advance(CheckoutState::Aborted(Stage::AdjustStock));
            return Err(self
                .abort(Stage::AdjustStock, source, saga, &clients, lease.is_some(), &lock_keys)
                .await);
        }
        for item in &cart.items {
            saga.push(Compensation::RestoreStock {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }
        state.advance(CheckoutState::StockAdjusted);

        if self.settings.serialization == SerializationMode::PerProduct {
            drop(lease.take());
        }

        let intent = PaymentIntent {
            basic_auth_header: basic_auth_header(&self.settings.payment.server_key),
            payment_type: &self.settings.payment.payment_type,
            transaction_details: TransactionDetails {
                order_id: order_id.clone(),
                gross_amount: cart.total,
            },
            bank_transfer: request.bank_transfer.clone().unwrap_or_else(|| BankTransfer {
                bank: self.settings.payment.default_bank.clone(),
            }),
            user_id: request.user_id,
            total_price: cart.total,
            product_order: &cart.items,
        };
        let payment = match clients.payment.create_payment(&intent).await {
            Ok(payment) => payment,
            Err(source) => {
                state.advance(CheckoutState::Aborted(Stage::InitiatePayment));
                return Err(self
                    .abort(Stage::InitiatePayment, source, saga, &clients, lease.is_some(), &lock_keys)
                    .await);
            }
        };
        state.advance(CheckoutState::PaymentInitiated);

        if let Some(confirmation) = payment.confirmation() {
            tracing::debug!(
                order_id = %order_id,
                transaction_id = %confirmation.transaction_id,
                transaction_status = %confirmation.transaction_status,
                "Payment initiated"
            );
        }
        state.advance(CheckoutState::Done);

        Ok(CheckoutReceipt {
            order_id,
            total: cart.total,
            payment,
        })
    }

    /// Unwind committed side effects (when enabled) and build the error.
    async fn abort(
        &self,
        stage: Stage,
        source: DownstreamError,
        saga: CompensationStack,
        clients: &ServiceClients,
        lease_held: bool,
        lock_keys: &[String],
    ) -> CheckoutError {
        if !self.settings.compensation {
            tracing::warn!(
                stage = %stage,
                pending = saga.len(),
                "Compensation disabled; committed side effects remain"
            );
            return CheckoutError::Downstream {
                stage,
                source,
                compensation: None,
            };
        }

        let report = saga.unwind(clients, &self.locks, lease_held, lock_keys).await;
        tracing::info!(
            stage = %stage,
            actions = report.outcomes.len(),
            fully_compensated = report.fully_compensated(),
            "Compensation finished"
        );
        CheckoutError::Downstream {
            stage,
            source,
            compensation: Some(report),
        }
    }

    fn lock_keys(&self, request: &CheckoutRequest) -> Vec<String> {
        match self.settings.serialization {
            SerializationMode::PerProduct => request.product_ids(),
            SerializationMode::Global => vec![GLOBAL_KEY.to_string()],
        }
    }
}
