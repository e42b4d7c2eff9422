use crate::common::{operations, ServiceError, ServiceResult};
use crate::users::commands::create_user::register_user;
use crate::users::GetUserResponse;
use domain::{validate_fields, DomainError, UnitOfWorkFactory};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// User Service - orchestrates the user CRUD use cases.
///
/// Each call opens its own unit of work. Failures come back as
/// [`ServiceError`]s; nothing escapes as a raw store error.
pub struct UserService {
    scopes: Arc<dyn UnitOfWorkFactory>,
}

impl UserService {
    pub fn new(scopes: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { scopes }
    }

    pub async fn get_all_users(&self, cancel: &CancellationToken) -> ServiceResult<Vec<GetUserResponse>> {
        info!("Getting all users");

        let uow = self.scopes.begin();
        match uow.users().get_all(cancel).await {
            Ok(users) => Ok(users.into_iter().map(GetUserResponse::from).collect()),
            Err(e) => Err(ServiceError::unexpected(operations::GET_ALL_USERS, &e).logged("getting all users")),
        }
    }

    pub async fn get_user_by_id(&self, user_id: Uuid, cancel: &CancellationToken) -> ServiceResult<GetUserResponse> {
        info!(%user_id, "Getting user by ID");

        let uow = self.scopes.begin();
        let failure = match uow.users().get_by_id(user_id, cancel).await {
            Ok(Some(user)) => return Ok(user.into()),
            Ok(None) => ServiceError::not_found(operations::GET_USER),
            Err(e) => ServiceError::unexpected(operations::GET_USER, &e),
        };
        Err(failure.logged("getting user by ID"))
    }

    pub async fn create_user(&self, name: &str, email: &str, cancel: &CancellationToken) -> ServiceResult {
        info!(%name, %email, "Creating user");

        match register_user(self.scopes.as_ref(), name.to_string(), email.to_string(), cancel).await {
            Ok(user_id) => {
                info!(%user_id, "User created successfully");
                Ok(())
            }
            Err(e) => Err(e.logged("creating user")),
        }
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult {
        info!(%user_id, %name, %email, "Updating user");

        match self.try_update(user_id, name, email, cancel).await {
            Ok(()) => {
                info!(%user_id, "User updated successfully");
                Ok(())
            }
            Err(e) => Err(e.logged("updating user")),
        }
    }

    pub async fn delete_user(&self, user_id: Uuid, cancel: &CancellationToken) -> ServiceResult {
        info!(%user_id, "Deleting user");

        match self.try_delete(user_id, cancel).await {
            Ok(()) => {
                info!(%user_id, "User deleted successfully");
                Ok(())
            }
            Err(e) => Err(e.logged("deleting user")),
        }
    }

    async fn try_update(&self, user_id: Uuid, name: &str, email: &str, cancel: &CancellationToken) -> ServiceResult {
        let op = operations::UPDATE_USER;
        let unexpected = |e: DomainError| ServiceError::unexpected(op, &e);

        validate_fields(name, email).map_err(|e| match e {
            DomainError::ValidationError(message) => ServiceError::validation(op, message),
            other => unexpected(other),
        })?;

        let uow = self.scopes.begin();
        let users = uow.users();

        let mut user = users
            .get_by_id(user_id, cancel)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| ServiceError::not_found(op))?;

        // Keeping one's own email is fine; taking someone else's is not
        if let Some(existing) = users.get_by_email(email, cancel).await.map_err(unexpected)? {
            if existing.user_id != user_id {
                return Err(ServiceError::email_exists(op, "Email is already taken by another user"));
            }
        }

        user.rename(name.to_string(), email.to_string());
        users.update(user);

        uow.save_changes(cancel).await.map_err(|e| match e {
            DomainError::DuplicateKey(_) => {
                ServiceError::email_exists(op, "Email is already taken by another user")
            }
            other => unexpected(other),
        })?;

        Ok(())
    }

    async fn try_delete(&self, user_id: Uuid, cancel: &CancellationToken) -> ServiceResult {
        let op = operations::DELETE_USER;

        let uow = self.scopes.begin();
        let users = uow.users();

        let user = users
            .get_by_id(user_id, cancel)
            .await
            .map_err(|e| ServiceError::unexpected(op, &e))?
            .ok_or_else(|| ServiceError::not_found(op))?;

        users.delete(user);
        uow.save_changes(cancel)
            .await
            .map_err(|e| ServiceError::unexpected(op, &e))?;

        Ok(())
    }
}
