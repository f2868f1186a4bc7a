//! Authentication service for the Joy Kunga application
//!
//! Password hashing, access/refresh token issuance and rotation, account
//! management, and the middleware other services use to authenticate
//! requests.

pub mod accounts;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod session;
pub mod validation;

use crate::{accounts::AccountService, jwt::TokenService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub tokens: TokenService,
}
