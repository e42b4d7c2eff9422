use domain::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read projection of a user; the creation timestamp stays internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for GetUserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
        }
    }
}
