//! Compensation stack for partially committed checkouts.
//!
//! Each forward step that commits a side effect in another service pushes
//! the action that undoes it. On failure the stack is unwound in reverse.
//! Every action is attempted even if an earlier one fails; the outcomes are
//! collected into a [`CompensationReport`].

use uuid::Uuid;

use crate::checkout::inventory::InventoryLocks;
use crate::checkout::types::StockAdjustment;
use crate::downstream::{DownstreamError, DownstreamResult, Service, ServiceClients};
use crate::observability::metrics;

/// Undo action for one committed side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    CancelOrder { user_id: Uuid, order_id: String },
    RestoreStock { product_id: String, quantity: u32 },
}

impl Compensation {
    pub fn action(&self) -> &'static str {
        match self {
            Compensation::CancelOrder { .. } => "cancel_order",
            Compensation::RestoreStock { .. } => "restore_stock",
        }
    }

    fn target(&self) -> &str {
        match self {
            Compensation::CancelOrder { order_id, .. } => order_id,
            Compensation::RestoreStock { product_id, .. } => product_id,
        }
    }
}

/// Result of one compensating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationOutcome {
    pub action: &'static str,
    pub target: String,
    /// `None` on success, otherwise the failure message.
    pub error: Option<String>,
}

/// Outcomes of an unwind, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub outcomes: Vec<CompensationOutcome>,
}

impl CompensationReport {
    pub fn fully_compensated(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    fn record(&mut self, action: &Compensation, result: &DownstreamResult<()>) {
        let ok = result.is_ok();
        metrics::record_compensation(action.action(), ok);
        if let Err(e) = result {
            tracing::error!(
                action = action.action(),
                target = action.target(),
                error = %e,
                "Compensation failed"
            );
        }
        self.outcomes.push(CompensationOutcome {
            action: action.action(),
            target: action.target().to_string(),
            error: result.as_ref().err().map(ToString::to_string),
        });
    }
}

/// Pending compensations for one checkout.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every pending action, most recent first.
    ///
    /// Adjacent `RestoreStock` entries run as one batch: one fresh stock read
    /// and one write. When `lease_held` is false the batch re-acquires
    /// `lock_keys` first so the restore cannot interleave with another
    /// checkout's decrement.
    pub async fn unwind(
        self,
        clients: &ServiceClients,
        locks: &InventoryLocks,
        lease_held: bool,
        lock_keys: &[String],
    ) -> CompensationReport {
        let mut report = CompensationReport::default();
        let mut restores: Vec<Compensation> = Vec::new();

        for action in self.actions.into_iter().rev() {
            match action {
                Compensation::RestoreStock { .. } => restores.push(action),
                Compensation::CancelOrder {
                    user_id,
                    ref order_id,
                } => {
                    flush_restores(&mut restores, &mut report, clients, locks, lease_held, lock_keys)
                        .await;
                    let result = clients.order.cancel_order(user_id, order_id).await;
                    report.record(&action, &result);
                }
            }
        }
        flush_restores(&mut restores, &mut report, clients, locks, lease_held, lock_keys).await;

        report
    }
}

async fn flush_restores(
    restores: &mut Vec<Compensation>,
    report: &mut CompensationReport,
    clients: &ServiceClients,
    locks: &InventoryLocks,
    lease_held: bool,
    lock_keys: &[String],
) {
    if restores.is_empty() {
        return;
    }

    let _lease = if lease_held {
        None
    } else {
        Some(locks.acquire(lock_keys.iter().cloned()).await)
    };

    let result = restore_stock(restores, clients).await;
    for action in restores.drain(..) {
        report.record(&action, &result);
    }
}

/// Read current stock and add the reserved quantities back.
async fn restore_stock(restores: &[Compensation], clients: &ServiceClients) -> DownstreamResult<()> {
    let items: Vec<(&str, u32)> = restores
        .iter()
        .filter_map(|action| match action {
            Compensation::RestoreStock {
                product_id,
                quantity,
            } => Some((product_id.as_str(), *quantity)),
            Compensation::CancelOrder { .. } => None,
        })
        .collect();
    let ids: Vec<String> = items.iter().map(|(id, _)| id.to_string()).collect();

    let snapshots = clients.product.fetch_products(&ids, ids.len() as u32).await?;

    let mut adjustments = Vec::with_capacity(items.len());
    for (product_id, quantity) in items {
        let current = snapshots
            .iter()
            .find(|s| s.product_id == product_id)
            .ok_or_else(|| DownstreamError::Decode {
                service: Service::Product,
                message: format!("product {product_id} missing from stock read"),
            })?;
        adjustments.push(StockAdjustment {
            product_id: product_id.to_string(),
            new_stock: current.available_stock + i64::from(quantity),
        });
    }

    clients.product.update_stocks(&adjustments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServicesConfig, TimeoutConfig};

    fn unreachable_clients() -> ServiceClients {
        let services = ServicesConfig {
            product_url: "http://127.0.0.1:9".into(),
            order_url: "http://127.0.0.1:9".into(),
            payment_url: "http://127.0.0.1:9".into(),
        };
        let timeouts = TimeoutConfig {
            connect_secs: 1,
            downstream_secs: 1,
            request_secs: 5,
        };
        ServiceClients::new(&services, &timeouts).unwrap()
    }

    #[test]
    fn test_report_success_tracking() {
        let mut report = CompensationReport::default();
        assert!(report.fully_compensated());

        let cancel = Compensation::CancelOrder {
            user_id: Uuid::nil(),
            order_id: "o-1".into(),
        };
        report.record(&cancel, &Ok(()));
        assert!(report.fully_compensated());

        report.record(
            &cancel,
            &Err(DownstreamError::Transport {
                service: Service::Order,
                message: "refused".into(),
            }),
        );
        assert!(!report.fully_compensated());
        assert_eq!(report.outcomes[1].target, "o-1");
    }

    #[tokio::test]
    async fn test_unwind_runs_in_reverse_and_attempts_everything() {
        let mut stack = CompensationStack::default();
        stack.push(Compensation::CancelOrder {
            user_id: Uuid::nil(),
            order_id: "o-1".into(),
        });
        stack.push(Compensation::RestoreStock {
            product_id: "p1".into(),
            quantity: 2,
        });
        stack.push(Compensation::RestoreStock {
            product_id: "p2".into(),
            quantity: 1,
        });
        assert_eq!(stack.len(), 3);

        let locks = InventoryLocks::new();
        let keys = vec!["p1".to_string(), "p2".to_string()];
        let report = stack
            .unwind(&unreachable_clients(), &locks, false, &keys)
            .await;

        let actions: Vec<_> = report.outcomes.iter().map(|o| o.action).collect();
        assert_eq!(actions, ["restore_stock", "restore_stock", "cancel_order"]);
        let targets: Vec<_> = report.outcomes.iter().map(|o| o.target.as_str()).collect();
        assert_eq!(targets, ["p2", "p1", "o-1"]);
        assert!(!report.fully_compensated());
        // The re-acquired lease was released.
        assert_eq!(locks.active_keys(), 0);
    }
}
