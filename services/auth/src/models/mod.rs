//! Authentication service request and response payloads

pub mod user;

// Re-export for convenience
pub use user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
    UpdateAccountRequest, UpdateImageRequest,
};
