use thiserror::Error;

use crate::db_types::{ChargeId, ChargeStateError};
use crate::gateway_types::PayloadError;
use crate::traits::PortError;

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("Charge state error: {0}")]
    State(#[from] ChargeStateError),
    #[error("{0}")]
    Port(#[from] PortError),
    #[error("Charge {0} carries no transactions to reconcile")]
    MissingTransaction(ChargeId),
}
