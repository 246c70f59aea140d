//! Helpers for tests and adapter development: logging bootstrap, randomised webhook payload
//! builders and a canned flattened record.
mod builders;
mod prepare_env;

pub use builders::{sample_charge_record, ChargeWebhookBuilder, TransactionWebhookBuilder};
pub use prepare_env::prepare_test_env;
