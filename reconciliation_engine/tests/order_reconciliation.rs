//! Scenario tests for the order reconciliation state machine, driven end to end against
//! recording port doubles.
mod support;

use reconciliation_engine::db_types::OrderStatus;
use reconciliation_engine::Reconciliation;
use support::*;

#[tokio::test]
async fn invoice_refusal_returns_the_reason_and_mutates_nothing() {
    init_logging();
    let h = harness(StubInvoices::refusing("Order total mismatch"));
    let order = order_with_charges("or_1", OrderStatus::Paid, vec![charge_with_request("ch_1", 1000, "")]);
    let mut platform = RecordingPlatformOrder::with_status("pending");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();

    assert_eq!(outcome, Reconciliation::InvoiceRefused { reason: Some("Order total mismatch".to_string()) });
    // no persistence, no platform side effects, no acquirer traffic before invoice confirmation
    assert!(h.orders.records().is_empty());
    assert!(h.cards.records().is_empty());
    assert!(h.acquirer.requests().is_empty());
    assert!(platform.effects().is_empty());
    assert_eq!(platform.status, "pending");
}

#[tokio::test]
async fn paid_order_completes_payment_and_stores_cards() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges("or_2", OrderStatus::Paid, vec![card_paying_customer_charge("ch_2", 5000)]);
    let mut platform = RecordingPlatformOrder::with_status("pending");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();

    assert_eq!(outcome, Reconciliation::Completed);
    assert_eq!(h.invoices.invoice_log(), vec!["state:Paid".to_string(), "saved".to_string()]);
    assert_eq!(h.acquirer.requests(), vec!["capture:or_2".to_string()]);

    let persisted = h.orders.records();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].status, OrderStatus::Processing);

    let cards = h.cards.records();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].customer_id.as_str(), "cus_42");
    assert_eq!(cards[0].card.last_four_digits, "0004");

    let comments = platform.history_comments();
    assert_eq!(comments, vec!["Order paid. Gateway id: or_2".to_string()]);
    use support::Effect::*;
    let effects = platform.effects();
    assert!(effects.contains(&SetState(reconciliation_engine::traits::OrderState::Processing)));
    assert!(effects.contains(&Email("New order status: processing".to_string())));
}

#[tokio::test]
async fn pending_order_requests_authorization_and_synchronizes_the_platform() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges("or_3", OrderStatus::Pending, vec![charge_with_request("ch_3", 2500, "")]);
    let mut platform = RecordingPlatformOrder::with_status("new");
    platform.notify_on_email = true;

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();

    assert_eq!(outcome, Reconciliation::Completed);
    assert_eq!(h.acquirer.requests(), vec!["authorization:or_3".to_string()]);
    assert_eq!(h.orders.records().len(), 1);
    assert_eq!(h.orders.records()[0].status, OrderStatus::Pending);

    use support::Effect::*;
    assert_eq!(
        platform.effects(),
        vec![
            SetStatus("pending".to_string()),
            Saved,
            Email("New order status: pending".to_string()),
            AdditionalInformation { charge_count: 1 },
            HistoryComment { message: "Order pending at the gateway. Id: or_3".to_string(), notify: true },
        ]
    );
}

#[tokio::test]
async fn processing_order_notifies_retry_then_runs_the_pending_flow() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges("or_4", OrderStatus::Processing, vec![charge_with_request("ch_4", 900, "")]);
    let mut platform = RecordingPlatformOrder::with_status("payment_review");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();

    assert_eq!(outcome, Reconciliation::Completed);
    // the retry notification fires against the platform's pre-sync status…
    use support::Effect::*;
    let effects = platform.effects();
    assert_eq!(effects[0], Email("New order status: payment_review".to_string()));
    assert_eq!(
        effects[1],
        HistoryComment {
            message: "Order waiting for online retries at the gateway. Gateway id: or_4".to_string(),
            notify: false
        }
    );
    // …and the full pending handling still runs afterwards
    assert_eq!(h.acquirer.requests(), vec!["authorization:or_4".to_string()]);
    assert_eq!(h.orders.records()[0].status, OrderStatus::Pending);
    assert_eq!(platform.history_comments().len(), 2);
}

#[tokio::test]
async fn canceled_order_consolidates_acquirer_messages_into_one_comment() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges(
        "or_5",
        OrderStatus::Canceled,
        vec![
            charge_with_request("ch_a", 1000, "Cartão recusado"),
            charge_with_request("ch_b", 2000, "Saldo insuficiente"),
        ],
    );
    let mut platform = RecordingPlatformOrder::with_status("new");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();

    assert_eq!(
        outcome,
        Reconciliation::AuthorizationFailed {
            message: "One or more charges weren't authorized. Please try again.".to_string()
        }
    );
    let comments = platform.history_comments();
    assert_eq!(comments.len(), 2);
    // pairs appear in charge order, semicolon-joined, no trailing separator
    assert_eq!(
        comments[0],
        "Order payment failed (or_5) : ch_a => Cartão recusado; ch_b => Saldo insuficiente"
    );
    assert_eq!(comments[1], "Order canceled.");
    assert_eq!(h.orders.records()[0].status, OrderStatus::Canceled);

    use support::Effect::*;
    assert!(platform.effects().contains(&SetState(reconciliation_engine::traits::OrderState::Canceled)));
    assert!(platform.effects().contains(&SetStatus("canceled".to_string())));
}

#[tokio::test]
async fn failed_orders_share_the_canceled_handler() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges("or_6", OrderStatus::Failed, vec![charge_with_request("ch_f", 100, "Timeout")]);
    let mut platform = RecordingPlatformOrder::with_status("new");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();
    assert!(matches!(outcome, Reconciliation::AuthorizationFailed { .. }));
    // failed persists as canceled, same as an explicit cancel
    assert_eq!(h.orders.records()[0].status, OrderStatus::Canceled);
}

#[tokio::test]
async fn statuses_outside_the_state_machine_pass_through() {
    init_logging();
    let h = harness(StubInvoices::default());
    let order = order_with_charges("or_7", OrderStatus::ChargedBack, vec![]);
    let mut platform = RecordingPlatformOrder::with_status("complete");

    let outcome = h.reconciler.reconcile_order(order, &mut platform).await.unwrap();
    assert_eq!(outcome, Reconciliation::Unhandled(OrderStatus::ChargedBack));
    assert!(platform.effects().is_empty());
    assert!(h.orders.records().is_empty());
}
