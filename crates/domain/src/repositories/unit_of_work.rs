use crate::errors::DomainError;
use crate::repositories::UserRepository;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One logical operation's worth of staged writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    /// Applies every staged change in a single transaction and returns the
    /// number of affected rows. On error nothing is committed and the staged
    /// changes are dropped.
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, DomainError>;
}

/// Opens a fresh [`UnitOfWork`] per operation, so concurrent callers never
/// see each other's pending writes.
pub trait UnitOfWorkFactory: Send + Sync {
    fn begin(&self) -> Box<dyn UnitOfWork>;
}
