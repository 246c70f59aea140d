//! The status-driven reconciliation state machine.
//!
//! A freshly parsed order or charge enters through [`Reconciler::reconcile_order`] or
//! [`Reconciler::reconcile_subscription_charge`]; the handler matching the aggregate's gateway
//! status mutates state, persists it through the repository ports and emits the platform-visible
//! side effects (history comments, status emails, invoice creation).
//!
//! The reconciler performs one attempt: it fails fast on the first port error and leaves partial
//! state only up to the last completed save. Redelivery, retry policy and per-order serialization
//! are the caller's responsibility; handler bodies are written to be safe under at-least-once
//! delivery (idempotent transaction attachment, no status mutation before invoice confirmation).
mod charge_handler;
mod errors;
mod order_handler;

use std::fmt::Debug;

use crate::db_types::{Charge, Order, OrderStatus, SavedCard};
use crate::events::{ChargeReconciledEvent, EventProducers, OrderAnnulledEvent, OrderPaidEvent};
use crate::traits::{AcquirerData, InvoiceHandling, PlatformOrder, PortError, Repository};
use log::debug;

pub use charge_handler::history_comment_for;
pub use errors::ReconcileError;

/// Outcome of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Completed,
    /// The paid flow stopped because the platform declined to create an invoice. Nothing was
    /// mutated or persisted.
    InvoiceRefused { reason: Option<String> },
    /// The order was canceled/failed; `message` is the user-facing summary for the checkout.
    AuthorizationFailed { message: String },
    /// No handler exists for the order's status; the event passes through untouched.
    Unhandled(OrderStatus),
}

pub struct Reconciler<O, S, A, I> {
    orders: O,
    saved_cards: S,
    acquirer: A,
    invoices: I,
    producers: EventProducers,
}

impl<O, S, A, I> Debug for Reconciler<O, S, A, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reconciler")
    }
}

impl<O, S, A, I> Reconciler<O, S, A, I> {
    pub fn new(orders: O, saved_cards: S, acquirer: A, invoices: I, producers: EventProducers) -> Self {
        Self { orders, saved_cards, acquirer, invoices, producers }
    }
}

impl<O, S, A, I> Reconciler<O, S, A, I>
where
    O: Repository<Aggregate = Order>,
    S: Repository<Aggregate = SavedCard>,
    A: AcquirerData,
    I: InvoiceHandling,
{
    /// Copies the order's gateway status onto the platform order and commits it. This is the
    /// "synchronize platform order" step every handler ends with.
    pub(crate) async fn sync_platform_with<P: PlatformOrder>(
        &self,
        order: &Order,
        platform: &mut P,
    ) -> Result<(), PortError> {
        platform.set_status(&order.status.to_string());
        platform.save().await
    }

    pub(crate) async fn publish_order_paid(&self, order: &Order) {
        for producer in &self.producers.order_paid_producer {
            debug!("🧾️📬️ Notifying order-paid subscribers");
            producer.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    pub(crate) async fn publish_order_annulled(&self, order: &Order) {
        for producer in &self.producers.order_annulled_producer {
            debug!("🧾️📬️ Notifying order-annulled subscribers");
            producer.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    pub(crate) async fn publish_charge_reconciled(&self, charge: &Charge) {
        for producer in &self.producers.charge_reconciled_producer {
            debug!("🧾️📬️ Notifying charge-reconciled subscribers");
            producer.publish_event(ChargeReconciledEvent::new(charge.clone())).await;
        }
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }
}
