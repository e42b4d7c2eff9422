pub mod change_tracker;
pub mod database;
pub mod repositories;
pub mod unit_of_work;

pub use database::Database;
pub use repositories::SqliteUserRepository;
pub use unit_of_work::{SqliteUnitOfWork, SqliteUnitOfWorkFactory};
