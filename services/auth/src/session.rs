//! Session lifecycle: issuing, rotating and revoking token pairs
//!
//! Each user has at most one live refresh token, persisted as a digest on
//! the user record. Rotation swaps that digest with a compare-and-swap, so a
//! replayed or concurrently reused refresh token is rejected.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    jwt::TokenService,
};
use common::{SharedStore, models::User};

/// Token pair handed to a client after login or rotation
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Session manager for handling user sessions against the record store
#[derive(Clone)]
pub struct SessionManager {
    store: SharedStore,
    tokens: TokenService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: SharedStore, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let access_token = self
            .tokens
            .issue_access_token(user)
            .map_err(AuthError::Internal)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(user)
            .map_err(AuthError::Internal)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.access_token_expiry(),
        })
    }

    /// Start a new session, replacing whatever refresh token was live before
    pub async fn start_session(&self, user: &User) -> AuthResult<TokenPair> {
        info!("Creating session for user: {}", user.id);

        let pair = self.issue_pair(user)?;
        let digest = TokenService::hash_refresh_token(&pair.refresh_token);
        self.store.set_refresh_token(user.id, Some(&digest)).await?;

        Ok(pair)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn rotate_refresh_token(&self, incoming: &str) -> AuthResult<TokenPair> {
        let claims = self.tokens.verify_refresh_token(incoming)?;

        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let presented = TokenService::hash_refresh_token(incoming);
        if user.refresh_token_hash.as_deref() != Some(presented.as_str()) {
            warn!(
                "Refresh token for user {} is not the live one (revoked or reused)",
                user.id
            );
            return Err(AuthError::Unauthorized);
        }

        let pair = self.issue_pair(&user)?;
        let replacement = TokenService::hash_refresh_token(&pair.refresh_token);

        let swapped = self
            .store
            .swap_refresh_token(user.id, &presented, Some(&replacement))
            .await?;
        if !swapped {
            warn!("Concurrent refresh token rotation lost for user {}", user.id);
            return Err(AuthError::Unauthorized);
        }

        info!("Rotated refresh token for user: {}", user.id);
        Ok(pair)
    }

    /// Revoke the user's live refresh token
    pub async fn revoke(&self, user_id: Uuid) -> AuthResult<()> {
        info!("Revoking session for user: {}", user_id);
        self.store.set_refresh_token(user_id, None).await?;
        Ok(())
    }
}
