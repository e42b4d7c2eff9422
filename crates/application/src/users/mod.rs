pub mod commands;
pub mod queries;

pub use commands::{CreateUserCommand, CreateUserCommandHandler};
pub use queries::GetUserResponse;
