pub mod get_user_response;

pub use get_user_response::GetUserResponse;
