//! Gateway Payment Core reconciliation engine
//!
//! This library is the reconciliation core of the GPC payment-gateway integration, consumed by
//! the platform adapters (Magento, WooCommerce, …). It is platform-agnostic: everything that
//! touches a database or the host platform goes through the ports in [`mod@traits`].
//!
//! The library is divided into three main sections:
//! 1. Parsing ([`mod@gateway_types`], [`mod@charge_record`]). Heterogeneous gateway webhook
//!    payloads and the flattened persisted charge record are normalized into the typed aggregates
//!    of [`mod@db_types`]. Parsing validates enum membership at the boundary and never defaults
//!    an unknown status.
//! 2. Reconciliation ([`Reconciler`]). Status-driven handlers apply an incoming order/charge
//!    notification to local state: persistence through the repository ports, history comments,
//!    status emails and invoice creation on the platform order.
//! 3. Configuration ([`mod@configuration`]). Per-store settings with per-setting parent/child
//!    inheritance, consulted wherever store-level behavior affects parsing or reconciliation.
//!
//! The engine also emits events (order paid, order annulled, charge reconciled) through a simple
//! hook system ([`mod@events`]) so adapters can react without being called into directly.
pub mod charge_record;
pub mod configuration;
pub mod db_types;
pub mod events;
pub mod gateway_types;
mod reconciler;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use reconciler::{history_comment_for, ReconcileError, Reconciler, Reconciliation};
