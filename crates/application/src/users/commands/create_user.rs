use crate::abstractions::{Command, CommandHandler};
use crate::common::{operations, ServiceError, ServiceResult};
use async_trait::async_trait;
use domain::{validate_fields, DomainError, UnitOfWorkFactory, User};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
}

impl Command for CreateUserCommand {
    type Output = Uuid;
}

pub struct CreateUserCommandHandler {
    scopes: Arc<dyn UnitOfWorkFactory>,
}

impl CreateUserCommandHandler {
    pub fn new(scopes: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { scopes }
    }
}

#[async_trait]
impl CommandHandler<CreateUserCommand> for CreateUserCommandHandler {
    async fn handle(&self, command: CreateUserCommand, cancel: &CancellationToken) -> ServiceResult<Uuid> {
        info!(name = %command.name, email = %command.email, "Creating user");

        match register_user(self.scopes.as_ref(), command.name, command.email, cancel).await {
            Ok(user_id) => {
                info!(%user_id, "User created successfully");
                Ok(user_id)
            }
            Err(e) => Err(e.logged("creating user")),
        }
    }
}

/// Validate, check email uniqueness, stage, commit. Shared by the command
/// handler and `UserService::create_user`.
pub(crate) async fn register_user(
    scopes: &dyn UnitOfWorkFactory,
    name: String,
    email: String,
    cancel: &CancellationToken,
) -> ServiceResult<Uuid> {
    let op = operations::CREATE_USER;

    validate_fields(&name, &email).map_err(|e| match e {
        DomainError::ValidationError(message) => ServiceError::validation(op, message),
        other => ServiceError::unexpected(op, &other),
    })?;

    let uow = scopes.begin();
    let users = uow.users();

    let existing = users
        .get_by_email(&email, cancel)
        .await
        .map_err(|e| ServiceError::unexpected(op, &e))?;
    if existing.is_some() {
        return Err(ServiceError::email_exists(op, "User with this email already exists"));
    }

    let user = User::new(name, email);
    let user_id = user.user_id;

    users
        .add(user, cancel)
        .await
        .map_err(|e| ServiceError::unexpected(op, &e))?;

    uow.save_changes(cancel).await.map_err(|e| match e {
        // Lost a race with a concurrent create; the unique index caught it
        DomainError::DuplicateKey(_) => {
            ServiceError::email_exists(op, "User with this email already exists")
        }
        other => ServiceError::unexpected(op, &other),
    })?;

    Ok(user_id)
}
