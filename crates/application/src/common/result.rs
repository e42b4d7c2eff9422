use domain::DomainError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Operation names used as the prefix of every error code.
pub mod operations {
    pub const GET_ALL_USERS: &str = "GetAllUsers";
    pub const GET_USER: &str = "GetUser";
    pub const CREATE_USER: &str = "CreateUser";
    pub const UPDATE_USER: &str = "UpdateUser";
    pub const DELETE_USER: &str = "DeleteUser";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceErrorKind {
    NotFound,
    EmailExists,
    Validation,
    Error,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceErrorKind::NotFound => "NotFound",
            ServiceErrorKind::EmailExists => "EmailExists",
            ServiceErrorKind::Validation => "Validation",
            ServiceErrorKind::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Failure half of every application operation: a kind, a machine-readable
/// code such as `CreateUser.EmailExists`, and a message for humans.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{code}: {message}")]
pub struct ServiceError {
    #[serde(skip)]
    kind: ServiceErrorKind,
    code: String,
    message: String,
}

pub type ServiceResult<T = ()> = Result<T, ServiceError>;

impl ServiceError {
    pub fn new(operation: &str, kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: format!("{operation}.{kind}"),
            message: message.into(),
        }
    }

    pub fn not_found(operation: &str) -> Self {
        Self::new(operation, ServiceErrorKind::NotFound, "User not found")
    }

    pub fn email_exists(operation: &str, message: impl Into<String>) -> Self {
        Self::new(operation, ServiceErrorKind::EmailExists, message)
    }

    pub fn validation(operation: &str, message: impl Into<String>) -> Self {
        Self::new(operation, ServiceErrorKind::Validation, message)
    }

    /// Wraps anything the operation did not anticipate.
    pub fn unexpected(operation: &str, error: &DomainError) -> Self {
        Self::new(operation, ServiceErrorKind::Error, error.to_string())
    }

    /// Logs the failure at a level matching its kind and hands it back.
    pub(crate) fn logged(self, action: &str) -> Self {
        match self.kind {
            ServiceErrorKind::Error => {
                error!(code = %self.code, error = %self.message, "Error {}", action)
            }
            _ => warn!(code = %self.code, reason = %self.message, "Rejected {}", action),
        }
        self
    }

    pub fn kind(&self) -> ServiceErrorKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ServiceError::not_found(operations::GET_USER), "GetUser.NotFound", ServiceErrorKind::NotFound)]
    #[case(
        ServiceError::email_exists(operations::CREATE_USER, "taken"),
        "CreateUser.EmailExists",
        ServiceErrorKind::EmailExists
    )]
    #[case(
        ServiceError::validation(operations::UPDATE_USER, "bad"),
        "UpdateUser.Validation",
        ServiceErrorKind::Validation
    )]
    #[case(
        ServiceError::unexpected(operations::DELETE_USER, &DomainError::Cancelled),
        "DeleteUser.Error",
        ServiceErrorKind::Error
    )]
    fn codes_are_operation_dot_kind(
        #[case] error: ServiceError,
        #[case] code: &str,
        #[case] kind: ServiceErrorKind,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.kind(), kind);
    }

    #[rstest]
    fn unexpected_keeps_the_underlying_message() {
        let error = ServiceError::unexpected(
            operations::GET_ALL_USERS,
            &DomainError::RepositoryError("disk full".to_string()),
        );
        assert_eq!(error.message(), "Repository error: disk full");
        assert_eq!(error.to_string(), "GetAllUsers.Error: Repository error: disk full");
    }
}
