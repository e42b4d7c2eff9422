pub mod user;

pub use user::*;

/// An identifiable aggregate that repositories can store.
pub trait Entity: Send + Sync + 'static {
    type Id: Copy + Send + Sync + std::fmt::Debug + std::fmt::Display + 'static;

    fn id(&self) -> Self::Id;
}
