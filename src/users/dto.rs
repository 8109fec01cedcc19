use serde::{Deserialize, Serialize};

use super::repo_types::PublicUser;

/// Request body for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub message: &'static str,
}

pub const LOGGED_IN_MESSAGE: &str = " you are now logged in!";
pub const USER_NOT_FOUND: &str = "No user found with this id";
pub const NO_SUCH_EMAIL: &str = "No user with that email exists!";
pub const WRONG_PASSWORD: &str = "The password was incorrect!";
