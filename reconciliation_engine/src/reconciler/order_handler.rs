//! Order-level status handlers.
//!
//! State machine: `processing → pending → {paid | canceled/failed}`. The `processing` handler
//! notifies the customer that the gateway is retrying and then runs the full `pending` handling:
//! a processing order must also get its authorization request and pending bookkeeping, so the
//! fall-through is deliberate even though it produces a second history comment.

use log::*;

use crate::db_types::{Order, OrderStatus, SavedCard};
use crate::reconciler::{ReconcileError, Reconciler, Reconciliation};
use crate::traits::{AcquirerData, InvoiceHandling, InvoiceState, OrderState, PlatformInvoice, PlatformOrder, PortError, Repository};

/// Fixed user-facing message returned when authorization fails across the order's charges.
pub(crate) const AUTHORIZATION_FAILED_MESSAGE: &str = "One or more charges weren't authorized. Please try again.";

impl<O, S, A, I> Reconciler<O, S, A, I>
where
    O: Repository<Aggregate = Order>,
    S: Repository<Aggregate = SavedCard>,
    A: AcquirerData,
    I: InvoiceHandling,
{
    /// Dispatches the order to the handler matching its gateway status.
    ///
    /// Statuses outside the reconciliation state machine pass through with
    /// [`Reconciliation::Unhandled`]; they belong to other collaborators.
    pub async fn reconcile_order<P: PlatformOrder>(
        &self,
        order: Order,
        platform: &mut P,
    ) -> Result<Reconciliation, ReconcileError> {
        debug!("🧾️ Handling order [{}] status: {}", order.gateway_id, order.status);
        match order.status {
            OrderStatus::Processing => self.order_processing(order, platform).await,
            OrderStatus::Pending => self.order_pending(order, platform).await,
            OrderStatus::Paid => self.order_paid(order, platform).await,
            OrderStatus::Canceled | OrderStatus::Failed => self.order_canceled(order, platform).await,
            other => {
                trace!("🧾️ No order handler for status {other}; passing through");
                Ok(Reconciliation::Unhandled(other))
            },
        }
    }

    /// The gateway is still retrying the order online. Tell the customer, then run the whole
    /// pending flow so the authorization request and pending bookkeeping still happen.
    async fn order_processing<P: PlatformOrder>(
        &self,
        order: Order,
        platform: &mut P,
    ) -> Result<Reconciliation, ReconcileError> {
        let notified = platform.send_email(&format!("New order status: {}", platform.status())).await?;
        platform
            .add_history_comment(
                &format!("Order waiting for online retries at the gateway. Gateway id: {}", order.gateway_id),
                notified,
            )
            .await?;

        self.order_pending(order, platform).await
    }

    async fn order_pending<P: PlatformOrder>(
        &self,
        mut order: Order,
        platform: &mut P,
    ) -> Result<Reconciliation, ReconcileError> {
        self.request_authorization(&order).await?;

        order.status = OrderStatus::Pending;
        self.orders.save(&order).await?;
        self.sync_platform_with(&order, platform).await?;

        let notified = platform.send_email(&format!("New order status: {}", order.status)).await?;
        platform.add_additional_information(order.charges()).await?;
        platform
            .add_history_comment(&format!("Order pending at the gateway. Id: {}", order.gateway_id), notified)
            .await?;

        Ok(Reconciliation::Completed)
    }

    /// Payment confirmed by the gateway. The platform gets the last word: only after it agrees to
    /// create an invoice does any state move. A refusal returns the reason untouched, with no
    /// partial side effects.
    async fn order_paid<P: PlatformOrder>(
        &self,
        order: Order,
        platform: &mut P,
    ) -> Result<Reconciliation, ReconcileError> {
        let cant_create_reason = self.invoices.invoice_cant_be_created_reason(&order).await;
        let invoice = self.invoices.create_invoice_for(&order).await?;
        let Some(mut invoice) = invoice else {
            info!(
                "🧾️ [{}] Invoice refused: {}",
                order.gateway_id,
                cant_create_reason.as_deref().unwrap_or("no reason given")
            );
            return Ok(Reconciliation::InvoiceRefused { reason: cant_create_reason });
        };

        let order = self.complete_payment(order, platform, &mut invoice).await?;
        self.persist_saved_cards(&order).await?;
        self.publish_order_paid(&order).await;
        Ok(Reconciliation::Completed)
    }

    async fn complete_payment<P: PlatformOrder>(
        &self,
        mut order: Order,
        platform: &mut P,
        invoice: &mut I::Invoice,
    ) -> Result<Order, ReconcileError> {
        invoice.set_state(InvoiceState::Paid);
        invoice.save().await?;

        self.request_capture(&order).await?;

        order.status = OrderStatus::Processing;
        platform.set_state(OrderState::Processing);
        self.orders.save(&order).await?;
        self.sync_platform_with(&order, platform).await?;

        let notified = platform.send_email(&format!("New order status: {}", order.status)).await?;
        platform.add_additional_information(order.charges()).await?;
        platform
            .add_history_comment(&format!("Order paid. Gateway id: {}", order.gateway_id), notified)
            .await?;

        Ok(order)
    }

    /// Canceled and failed orders share one handler; the two statuses differ only in who
    /// triggered the cancellation.
    async fn order_canceled<P: PlatformOrder>(
        &self,
        mut order: Order,
        platform: &mut P,
    ) -> Result<Reconciliation, ReconcileError> {
        let failures: Vec<(String, String)> = order
            .charges()
            .iter()
            .map(|charge| {
                let message =
                    charge.transaction_request().map(|t| t.acquirer_message.clone()).unwrap_or_default();
                (charge.gateway_id.to_string(), message)
            })
            .collect();

        let summary =
            failures.iter().map(|(id, message)| format!("{id} => '{message}'")).collect::<Vec<_>>().join(", ");
        info!("🧾️❌️ Order [{}] creation failed: {summary}", order.gateway_id);

        let mut comment = format!("Order payment failed ({}) : ", order.gateway_id);
        comment.push_str(&failures.iter().map(|(id, message)| format!("{id} => {message}")).collect::<Vec<_>>().join("; "));
        platform.add_history_comment(&comment, false).await?;

        order.status = OrderStatus::Canceled;
        platform.set_state(OrderState::Canceled);
        platform.save().await?;

        self.orders.save(&order).await?;
        self.sync_platform_with(&order, platform).await?;

        let notified = platform.send_email(&format!("New order status: {}", order.status)).await?;
        platform.add_history_comment("Order canceled.", notified).await?;

        self.publish_order_annulled(&order).await;
        Ok(Reconciliation::AuthorizationFailed { message: AUTHORIZATION_FAILED_MESSAGE.to_string() })
    }

    async fn request_authorization(&self, order: &Order) -> Result<(), PortError> {
        info!("🧾️ [{}] Creating authorization transaction...", order.gateway_id);
        self.acquirer.create_authorization_transaction(order).await?;
        info!("🧾️ [{}] Authorization transaction created", order.gateway_id);
        Ok(())
    }

    async fn request_capture(&self, order: &Order) -> Result<(), PortError> {
        info!("🧾️ [{}] Creating capture transaction...", order.gateway_id);
        self.acquirer.create_capture_transaction(order).await?;
        info!("🧾️ [{}] Capture transaction created", order.gateway_id);
        Ok(())
    }

    /// Cards used on the order's charges are kept on file for their customers.
    async fn persist_saved_cards(&self, order: &Order) -> Result<(), PortError> {
        for charge in order.charges() {
            let Some(customer_id) = charge.customer.as_ref().and_then(|c| c.gateway_id.clone()) else {
                continue;
            };
            for transaction in charge.transactions() {
                if let Some(card) = &transaction.card {
                    let saved = SavedCard {
                        customer_id: customer_id.clone(),
                        card: card.clone(),
                        created_at: transaction.created_at,
                    };
                    let record_id = self.saved_cards.save(&saved).await?;
                    debug!(
                        "🧾️💳️ Stored card …{} for customer {customer_id} (record #{record_id})",
                        saved.card.last_four_digits
                    );
                }
            }
        }
        Ok(())
    }
}
