use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

/// Core User entity - represents the business domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// A brand new user with a server-generated id, stamped with the current time.
    pub fn new(name: String, email: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            name,
            email,
            created_at: Utc::now(),
        }
    }

    /// Rehydrates a user that already exists in storage.
    pub fn with_id(user_id: Uuid, name: String, email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name,
            email,
            created_at,
        }
    }

    /// Set once at creation.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, name: String, email: String) {
        self.name = name;
        self.email = email;
    }
}

/// Field rules shared by creation and update paths.
pub fn validate_fields(name: &str, email: &str) -> Result<(), crate::DomainError> {
    if name.trim().is_empty() {
        return Err(crate::DomainError::ValidationError("Name cannot be empty".to_string()));
    }

    if email.trim().is_empty() {
        return Err(crate::DomainError::ValidationError("Email cannot be empty".to_string()));
    }

    Ok(())
}

impl Entity for User {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;
    use rstest::rstest;

    #[rstest]
    fn new_user_gets_fresh_identity() {
        let a = User::new("Alice".to_string(), "a@x.com".to_string());
        let b = User::new("Alice".to_string(), "a@x.com".to_string());

        assert_ne!(a.user_id, b.user_id);
        assert!(a.created_at() <= Utc::now());
    }

    #[rstest]
    fn rename_keeps_identity_and_creation_time() {
        let mut user = User::new("Alice".to_string(), "a@x.com".to_string());
        let id = user.user_id;
        let created = user.created_at();

        user.rename("Alicia".to_string(), "alicia@x.com".to_string());

        assert_eq!(user.user_id, id);
        assert_eq!(user.created_at(), created);
        assert_eq!(user.name, "Alicia");
        assert_eq!(user.email, "alicia@x.com");
    }

    #[rstest]
    #[case("", "a@x.com", "Name cannot be empty")]
    #[case("   ", "a@x.com", "Name cannot be empty")]
    #[case("Alice", " ", "Email cannot be empty")]
    fn rejects_invalid_fields(#[case] name: &str, #[case] email: &str, #[case] expected: &str) {
        let err = validate_fields(name, email).unwrap_err();
        assert_eq!(err, DomainError::ValidationError(expected.to_string()));
    }

    #[rstest]
    #[case("Alice", "a@x.com")]
    #[case("Bob", "bob")]
    fn accepts_any_non_blank_fields(#[case] name: &str, #[case] email: &str) {
        assert!(validate_fields(name, email).is_ok());
    }
}
