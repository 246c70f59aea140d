//! Ports to the external collaborators of the reconciliation core.
//!
//! The core never talks to a database, the host platform or the acquirer directly; it drives the
//! traits defined here and adapters implement them per platform. Contracts, not conveniences:
//!
//! * [`Repository`] is the persistence port. One implementation per aggregate (orders, charges,
//!   configurations, saved cards). Each `save` is assumed atomic for a single aggregate; row
//!   locking/versioning is the adapter's problem.
//! * [`PlatformOrder`] is the host platform's view of an order: history comments, status emails,
//!   state changes. [`PlatformInvoice`] is the matching invoice handle.
//! * [`InvoiceHandling`] decides whether an invoice may be created for an order and creates it.
//! * [`AcquirerData`] requests authorization/capture transactions from the acquirer.
//!
//! Port failures are opaque to the core: they surface as [`PortError`] and abort the current
//! handler. Retry policy lives with the caller.
mod acquirer;
mod invoice;
mod platform;
mod repository;

pub use acquirer::AcquirerData;
pub use invoice::InvoiceHandling;
pub use platform::{InvoiceState, OrderState, PlatformInvoice, PlatformOrder};
pub use repository::{PortError, RecordId, Repository};
