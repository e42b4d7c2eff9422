use crate::entities::Entity;
use crate::errors::DomainError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Generic data-access gateway - a PORT in hexagonal architecture.
///
/// Reads go straight to the store. `add`, `update` and `delete` only stage
/// the change; nothing is written until the owning [`crate::UnitOfWork`]
/// commits.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<T>, DomainError>;
    async fn get_by_id(&self, id: T::Id, cancel: &CancellationToken) -> Result<Option<T>, DomainError>;
    async fn add(&self, entity: T, cancel: &CancellationToken) -> Result<(), DomainError>;
    fn update(&self, entity: T);
    fn delete(&self, entity: T);
}
