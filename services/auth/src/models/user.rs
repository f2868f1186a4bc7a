//! Account payloads

use serde::{Deserialize, Serialize};

use crate::session::TokenPair;
use common::models::User;

/// New account registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub handle_or_email: String,
    pub password: String,
}

/// Response for user login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Request for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Account details update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Avatar or cover image replacement (a reference to already-uploaded media)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateImageRequest {
    pub url: String,
}

/// Password change payload
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
