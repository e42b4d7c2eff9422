use super::{retry, Database};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use domain::DomainError;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Why a single attempt at a store command failed.
#[derive(Debug)]
enum StoreFailure {
    Pool(String),
    Query(DieselError),
    Panicked(String),
}

impl StoreFailure {
    fn is_transient(&self) -> bool {
        match self {
            StoreFailure::Pool(_) => true,
            StoreFailure::Query(e) => retry::is_transient(e),
            StoreFailure::Panicked(_) => false,
        }
    }
}

const RUNNING: u8 = 0;
const SEALED: u8 = 1;
const ABANDONED: u8 = 2;

/// Shared by a blocking command and the caller awaiting it.
///
/// A command that writes calls [`CommandGuard::seal`] right before it
/// commits. Whichever side moves first wins: a sealed command is awaited to
/// the end, an abandoned one rolls back.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandGuard {
    state: Arc<AtomicU8>,
}

impl CommandGuard {
    fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED
    }

    /// Fails with `RollbackTransaction` once the caller has stopped waiting.
    pub(crate) fn checkpoint(&self) -> QueryResult<()> {
        if self.is_abandoned() {
            Err(DieselError::RollbackTransaction)
        } else {
            Ok(())
        }
    }

    /// Last check before commit. Once it succeeds the caller keeps waiting
    /// for the outcome, even past its timeout or cancellation.
    pub(crate) fn seal(&self) -> QueryResult<()> {
        self.state
            .compare_exchange(RUNNING, SEALED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| DieselError::RollbackTransaction)
    }

    /// Returns false if the command already sealed.
    fn abandon(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Database {
    /// Runs a blocking Diesel command on the blocking pool.
    ///
    /// Transient failures are retried per the configured [`retry::RetryPolicy`],
    /// each attempt is bounded by the command timeout, and cancelling `cancel`
    /// abandons the call with [`DomainError::Cancelled`]. Writes must go
    /// through the [`CommandGuard`] so an abandoned attempt never commits.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        command: F,
    ) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: Fn(&mut SqliteConnection, &CommandGuard) -> QueryResult<T> + Send + Sync + 'static,
    {
        let command = Arc::new(command);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(DomainError::Cancelled);
            }

            let failure = match self.attempt(cancel, command.clone()).await? {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            attempt += 1;
            if !failure.is_transient() || attempt > self.retry.max_retries {
                return Err(self.to_domain_error(operation, failure));
            }

            let delay = self.retry.delay_for(attempt);
            warn!(operation, attempt, ?delay, "Transient database failure, retrying");

            tokio::select! {
                _ = cancel.cancelled() => return Err(DomainError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt<T, F>(
        &self,
        cancel: &CancellationToken,
        command: Arc<F>,
    ) -> Result<Result<T, StoreFailure>, DomainError>
    where
        T: Send + 'static,
        F: Fn(&mut SqliteConnection, &CommandGuard) -> QueryResult<T> + Send + Sync + 'static,
    {
        let guard = CommandGuard::default();
        let pool = self.pool.clone();
        let task_guard = guard.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreFailure::Pool(e.to_string()))?;
            task_guard.checkpoint().map_err(StoreFailure::Query)?;
            command(&mut *conn, &task_guard).map_err(StoreFailure::Query)
        });

        let interrupted = tokio::select! {
            biased;
            _ = cancel.cancelled() => DomainError::Cancelled,
            outcome = tokio::time::timeout(self.command_timeout, &mut task) => match outcome {
                Ok(joined) => return Ok(flatten(joined)),
                Err(_) => DomainError::Timeout(self.command_timeout),
            },
        };

        if guard.abandon() {
            return Err(interrupted);
        }

        // Already committing; report what actually happened
        Ok(flatten(task.await))
    }

    fn to_domain_error(&self, operation: &'static str, failure: StoreFailure) -> DomainError {
        let detail = match failure {
            StoreFailure::Query(DieselError::NotFound) => {
                return DomainError::NotFound(format!("{operation}: no matching row"));
            }
            // Only raised by a command whose caller gave up on it
            StoreFailure::Query(DieselError::RollbackTransaction) => {
                return DomainError::Cancelled;
            }
            StoreFailure::Query(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                return DomainError::DuplicateKey(info.message().to_string());
            }
            StoreFailure::Query(e) => e.to_string(),
            StoreFailure::Pool(e) => format!("connection pool: {e}"),
            StoreFailure::Panicked(e) => format!("database task failed: {e}"),
        };

        error!(operation, error = %detail, "Database command failed");

        if self.detailed_errors {
            DomainError::RepositoryError(detail)
        } else {
            DomainError::RepositoryError("database operation failed".to_string())
        }
    }
}

fn flatten<T>(joined: Result<Result<T, StoreFailure>, JoinError>) -> Result<T, StoreFailure> {
    joined.unwrap_or_else(|join| Err(StoreFailure::Panicked(join.to_string())))
}
