use serde::{Deserialize, Serialize};

use crate::db_types::{Charge, Order, OrderStatus};

/// Emitted after the paid-order flow completes (invoice created, capture requested).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an order is canceled or failed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatus,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}

/// Emitted after a subscription charge has been reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeReconciledEvent {
    pub charge: Charge,
}

impl ChargeReconciledEvent {
    pub fn new(charge: Charge) -> Self {
        Self { charge }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderAnnulled(OrderAnnulledEvent),
    ChargeReconciled(ChargeReconciledEvent),
}
