use crate::change_tracker::ChangeTracker;
use crate::database::Database;
use crate::repositories::sqlite_user_repository::apply_change;
use crate::repositories::SqliteUserRepository;
use async_trait::async_trait;
use domain::{DomainError, UnitOfWork, UnitOfWorkFactory, UserRepository};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A single request-scoped unit of work over the SQLite store.
pub struct SqliteUnitOfWork {
    db: Database,
    users: SqliteUserRepository,
}

impl SqliteUnitOfWork {
    pub fn new(db: Database) -> Self {
        let users = SqliteUserRepository::new(db.clone(), Arc::new(ChangeTracker::new()));
        Self { db, users }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, DomainError> {
        let changes = self.users.take_pending();
        if changes.is_empty() {
            return Ok(0);
        }

        let staged = changes.len();
        debug!(staged, "Committing staged changes");

        let affected = self
            .db
            .run("unit_of_work.save_changes", cancel, move |conn, guard| {
                conn.immediate_transaction(|tx| {
                    let mut affected = 0;
                    for change in &changes {
                        // Returning an error here rolls back everything applied so far
                        guard.checkpoint()?;
                        affected += apply_change(tx, change)?;
                    }
                    guard.seal()?;
                    Ok(affected)
                })
            })
            .await?;

        info!(staged, affected, "Committed unit of work");
        Ok(affected)
    }
}

/// Hands out a fresh [`SqliteUnitOfWork`] per operation.
#[derive(Clone)]
pub struct SqliteUnitOfWorkFactory {
    db: Database,
}

impl SqliteUnitOfWorkFactory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl UnitOfWorkFactory for SqliteUnitOfWorkFactory {
    fn begin(&self) -> Box<dyn UnitOfWork> {
        Box::new(SqliteUnitOfWork::new(self.db.clone()))
    }
}
