use config::DatabaseConfig;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use domain::DomainError;
use std::time::Duration;
use tracing::info;

mod command;
pub mod retry;
pub mod schema;

pub use retry::RetryPolicy;
pub use schema::*;

type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection setup run whenever the pool hands out a fresh connection.
#[derive(Debug)]
struct SqliteSession {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqliteSession {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Shared handle to the SQLite store. Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    retry: RetryPolicy,
    command_timeout: Duration,
    detailed_errors: bool,
    sensitive_data_logging: bool,
}

impl Database {
    /// Opens the pool and makes sure the schema exists.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let path = database_path(&config.connection_string);
        let in_memory = is_in_memory(path);

        let manager = ConnectionManager::<SqliteConnection>::new(path);
        // Waiting for a connection or a lock never outlasts a command
        let mut builder = r2d2::Pool::builder()
            .connection_timeout(config.command_timeout)
            .connection_customizer(Box::new(SqliteSession {
                busy_timeout: config.command_timeout,
            }));

        // Every in-memory connection is its own database, so keep exactly one alive
        builder = if in_memory {
            builder.max_size(1).idle_timeout(None).max_lifetime(None)
        } else {
            builder.max_size(config.max_pool_size)
        };

        let pool = builder.build(manager).map_err(|e| {
            DomainError::RepositoryError(format!("Failed to create SQLite connection pool: {e}"))
        })?;

        let database = Self {
            pool,
            retry: RetryPolicy::new(config.max_retry_count),
            command_timeout: config.command_timeout,
            detailed_errors: config.enable_detailed_errors,
            sensitive_data_logging: config.enable_sensitive_data_logging,
        };
        database.initialize_schema()?;

        info!(database = %path, in_memory, "SQLite database ready");
        Ok(database)
    }

    fn initialize_schema(&self) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;

        conn.batch_execute(schema::CREATE_SCHEMA)
            .map_err(|e| DomainError::RepositoryError(format!("Failed to create schema: {e}")))
    }

    /// Hides a value from logs unless sensitive-data logging is switched on.
    pub fn redact<'a>(&self, value: &'a str) -> &'a str {
        if self.sensitive_data_logging {
            value
        } else {
            "<redacted>"
        }
    }
}

fn database_path(connection_string: &str) -> &str {
    connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string)
}

fn is_in_memory(path: &str) -> bool {
    path == ":memory:" || path.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users.db", "users.db")]
    #[case("sqlite://data/users.db", "data/users.db")]
    #[case("sqlite::memory:", ":memory:")]
    fn strips_sqlite_scheme(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(database_path(input), expected);
    }

    #[rstest]
    fn detects_in_memory_databases() {
        assert!(is_in_memory(":memory:"));
        assert!(is_in_memory("file:users?mode=memory&cache=shared"));
        assert!(!is_in_memory("users.db"));
    }

    #[rstest]
    fn redacts_unless_sensitive_logging_enabled() {
        let quiet = Database::connect(&DatabaseConfig::in_memory()).unwrap();
        assert_eq!(quiet.redact("a@x.com"), "<redacted>");

        let chatty = Database::connect(&DatabaseConfig {
            enable_sensitive_data_logging: true,
            ..DatabaseConfig::in_memory()
        })
        .unwrap();
        assert_eq!(chatty.redact("a@x.com"), "a@x.com");
    }
}
