pub mod repository;
pub mod unit_of_work;
pub mod user_repository;

pub use repository::Repository;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
pub use user_repository::UserRepository;
