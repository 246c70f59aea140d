//! Charge-level reconciliation for the subscription/recurrence flow.
//!
//! Only `paid` gets explicit handling here; every other charge status passes through to other
//! collaborators. The paid handler tolerates two gateway quirks: a terminal `paid` event arriving
//! without the intermediate pay event (the paid amount is seeded straight from the transaction),
//! and the same terminal event being delivered more than once (`pay` is skipped once the charge
//! already reports paid).

use gpc_common::Cents;
use log::*;

use crate::db_types::{Charge, ChargeStatus, Order, SavedCard};
use crate::reconciler::{ReconcileError, Reconciler};
use crate::traits::{AcquirerData, InvoiceHandling, PlatformOrder, Repository};

impl<O, S, A, I> Reconciler<O, S, A, I>
where
    O: Repository<Aggregate = Order>,
    S: Repository<Aggregate = SavedCard>,
    A: AcquirerData,
    I: InvoiceHandling,
{
    pub async fn reconcile_subscription_charge<P: PlatformOrder>(
        &self,
        charge: &mut Charge,
        platform: &mut P,
    ) -> Result<(), ReconcileError> {
        debug!("🧾️🔁️ Handling subscription charge [{}] status: {}", charge.gateway_id, charge.status);
        match charge.status {
            ChargeStatus::Paid => self.subscription_charge_paid(charge, platform).await,
            other => {
                trace!("🧾️🔁️ No subscription handler for charge status {other}; passing through");
                Ok(())
            },
        }
    }

    async fn subscription_charge_paid<P: PlatformOrder>(
        &self,
        charge: &mut Charge,
        platform: &mut P,
    ) -> Result<(), ReconcileError> {
        let transaction = charge
            .transactions()
            .first()
            .cloned()
            .ok_or_else(|| ReconcileError::MissingTransaction(charge.gateway_id.clone()))?;

        let paid_amount = transaction.paid_amount;
        charge.add_transaction(transaction);

        if charge.status != ChargeStatus::Paid {
            charge.pay(paid_amount)?;
        }
        if charge.paid_amount.is_zero() {
            charge.seed_paid_amount(paid_amount);
        }

        let history = history_comment_for(charge);
        platform.add_history_comment(&history, false).await?;
        platform.save().await?;

        self.publish_charge_reconciled(charge).await;
        Ok(())
    }
}

/// Composes the platform-facing reconciliation summary for a charge.
///
/// Settled charges report the received amount, annotated with the extra or remaining difference
/// against the nominal amount; a refund replaces the whole message, a partial cancellation is
/// appended. Any other status reads as a cancellation with the cumulative refund. Amounts are
/// printed in major currency units.
pub fn history_comment_for(charge: &Charge) -> String {
    if matches!(charge.status, ChargeStatus::Paid | ChargeStatus::Overpaid | ChargeStatus::Underpaid) {
        let mut history = format!("Payment received: {}", charge.paid_amount);

        let difference = charge.paid_amount.value() - charge.amount.value();
        if difference > 0 {
            history.push_str(&format!(". Extra amount paid: {}", Cents::from(difference)));
        }
        if difference < 0 {
            history.push_str(&format!(". Remaining amount: {}", Cents::from(-difference)));
        }

        if charge.refunded_amount.value() > 0 {
            history = format!("Refunded amount: {} (until now)", charge.refunded_amount);
        }

        if charge.canceled_amount.value() > 0 {
            history.push_str(&format!(" (Partial Payment. Canceled amount: {})", charge.canceled_amount));
        }

        return history;
    }

    format!("Charge canceled. Refunded amount: {} (until now)", charge.refunded_amount)
}
