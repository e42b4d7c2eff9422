pub mod messaging;

pub use messaging::{Command, CommandHandler};
