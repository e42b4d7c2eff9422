use crate::entities::User;
use crate::errors::DomainError;
use crate::repositories::Repository;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait UserRepository: Repository<User> {
    async fn get_by_email(&self, email: &str, cancel: &CancellationToken) -> Result<Option<User>, DomainError>;
}
