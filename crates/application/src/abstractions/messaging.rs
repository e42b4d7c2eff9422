use crate::common::ServiceResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A request to change state, handled by exactly one [`CommandHandler`].
pub trait Command: Send + 'static {
    type Output: Send;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C, cancel: &CancellationToken) -> ServiceResult<C::Output>;
}
