//! Middleware for JWT token validation and authentication
//!
//! Both middlewares take the [`TokenService`] as their own state, so any
//! router (this service's or the API's) can layer them.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    jwt::{AccessClaims, TokenService},
};

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub display_name: String,
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            handle: claims.handle,
            email: claims.email,
            display_name: claims.display_name,
        }
    }
}

/// The requesting viewer on routes where signing in is optional
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

type BearerHeader = TypedHeader<Authorization<Bearer>>;

/// Reject the request unless it carries a valid access token
pub async fn require_auth(
    State(tokens): State<TokenService>,
    bearer: Option<BearerHeader>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;
    let claims = tokens.verify_access_token(bearer.token())?;

    req.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(req).await)
}

/// Attach a [`Viewer`]; anonymous when no token is sent, rejected when a
/// token is sent but invalid
pub async fn optional_auth(
    State(tokens): State<TokenService>,
    bearer: Option<BearerHeader>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response> {
    let viewer = match bearer {
        Some(TypedHeader(Authorization(bearer))) => {
            Viewer(Some(tokens.verify_access_token(bearer.token())?.into()))
        }
        None => Viewer(None),
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}
