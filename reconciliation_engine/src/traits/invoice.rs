use crate::db_types::Order;
use crate::traits::{PlatformInvoice, PortError};

/// Invoice creation on the host platform.
#[allow(async_fn_in_trait)]
pub trait InvoiceHandling {
    type Invoice: PlatformInvoice;

    /// Why an invoice cannot be created for this order right now, if anything blocks it.
    /// `None` means creation is expected to succeed.
    async fn invoice_cant_be_created_reason(&self, order: &Order) -> Option<String>;

    /// Creates the invoice. `Ok(None)` is a refusal (the platform declined without a hard
    /// failure), distinct from `Err`, which is a port failure.
    async fn create_invoice_for(&self, order: &Order) -> Result<Option<Self::Invoice>, PortError>;
}
