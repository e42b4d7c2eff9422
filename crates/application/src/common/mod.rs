pub mod result;

pub use result::{operations, ServiceError, ServiceErrorKind, ServiceResult};
