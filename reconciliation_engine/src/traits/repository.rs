use thiserror::Error;

/// Internal identifier assigned by the storage layer when an aggregate is persisted.
pub type RecordId = i64;

#[derive(Debug, Clone, Error)]
pub enum PortError {
    #[error("The requested record does not exist: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("External collaborator failed: {0}")]
    PortFailure(String),
}

/// The persistence port. Adapters implement this once per aggregate type; the engine only ever
/// sees aggregates go in and come out.
#[allow(async_fn_in_trait)]
pub trait Repository {
    type Aggregate;

    /// Persists the aggregate and returns its internal record id.
    async fn save(&self, aggregate: &Self::Aggregate) -> Result<RecordId, PortError>;

    async fn find(&self, id: RecordId) -> Result<Option<Self::Aggregate>, PortError>;

    async fn find_by_gateway_id(&self, gateway_id: &str) -> Result<Option<Self::Aggregate>, PortError>;

    async fn list(&self, limit: usize, include_disabled: bool) -> Result<Vec<Self::Aggregate>, PortError>;
}
