use crate::db_types::Order;
use crate::traits::PortError;

/// Requests money-movement transactions from the acquirer data service.
///
/// These are fire-and-forget from the core's perspective: the acquirer's answer arrives later as
/// a fresh gateway notification and flows through the reconciler again.
#[allow(async_fn_in_trait)]
pub trait AcquirerData {
    async fn create_authorization_transaction(&self, order: &Order) -> Result<(), PortError>;

    async fn create_capture_transaction(&self, order: &Order) -> Result<(), PortError>;
}
