use std::fmt::Display;

use crate::db_types::Charge;
use crate::traits::PortError;

//--------------------------------------      OrderState       -------------------------------------------------------
/// The host platform's coarse order state. Distinct from the gateway's [`crate::db_types::OrderStatus`]:
/// platforms collapse the payment lifecycle into a handful of fulfilment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    New,
    PendingPayment,
    Processing,
    Complete,
    Closed,
    Canceled,
    Holded,
}

impl Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderState::New => "new",
            OrderState::PendingPayment => "pending_payment",
            OrderState::Processing => "processing",
            OrderState::Complete => "complete",
            OrderState::Closed => "closed",
            OrderState::Canceled => "canceled",
            OrderState::Holded => "holded",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------     InvoiceState      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceState {
    Open,
    Paid,
    Canceled,
}

//--------------------------------------     PlatformOrder     -------------------------------------------------------
/// Handle to the order as the host platform sees it. The reconciler mutates it (comments, emails,
/// state) and calls `save` to commit; nothing reaches the customer before `save`.
#[allow(async_fn_in_trait)]
pub trait PlatformOrder {
    /// The platform-side order identifier (increment id).
    fn increment_id(&self) -> String;

    /// The platform's current status label for the order.
    fn status(&self) -> String;

    fn set_status(&mut self, status: &str);

    fn set_state(&mut self, state: OrderState);

    async fn add_history_comment(&mut self, message: &str, notify_customer: bool) -> Result<(), PortError>;

    /// Sends a status email to the customer. Returns whether the customer was actually notified;
    /// platforms suppress mails in various situations and the caller threads the answer into the
    /// matching history comment.
    async fn send_email(&mut self, message: &str) -> Result<bool, PortError>;

    /// Publishes charge details (instrument, amounts, boleto link) as additional order
    /// information visible in the platform's order view.
    async fn add_additional_information(&mut self, charges: &[Charge]) -> Result<(), PortError>;

    async fn save(&mut self) -> Result<(), PortError>;
}

//--------------------------------------    PlatformInvoice    -------------------------------------------------------
#[allow(async_fn_in_trait)]
pub trait PlatformInvoice {
    fn set_state(&mut self, state: InvoiceState);

    async fn save(&mut self) -> Result<(), PortError>;
}
