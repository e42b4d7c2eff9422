pub mod abstractions;
pub mod common;
pub mod services;
pub mod users;

pub use abstractions::*;
pub use common::*;
pub use services::*;
pub use users::*;

use config::DatabaseConfig;
use domain::{DomainError, UnitOfWorkFactory};
use infrastructure::{Database, SqliteUnitOfWorkFactory};
use std::sync::Arc;

/// User Application - wires the infrastructure into the application services
pub struct UserApp {
    pub user_service: UserService,
    pub create_user_handler: CreateUserCommandHandler,
}

impl UserApp {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DomainError> {
        // Infrastructure layer - database setup
        let database = Database::connect(config)?;
        let scopes: Arc<dyn UnitOfWorkFactory> = Arc::new(SqliteUnitOfWorkFactory::new(database));

        Ok(Self::with_scopes(scopes))
    }

    /// Builds the application over any unit-of-work source.
    pub fn with_scopes(scopes: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            user_service: UserService::new(scopes.clone()),
            create_user_handler: CreateUserCommandHandler::new(scopes),
        }
    }
}
