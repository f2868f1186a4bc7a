//! JWT service for token generation and validation
//!
//! Access and refresh tokens are HS256 JWTs signed with two distinct
//! secrets, so a refresh token can never pass as an access token and vice
//! versa. Refresh tokens are only ever persisted as a SHA-256 digest.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use common::models::User;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret used to sign access tokens
    pub access_secret: String,
    /// Secret used to sign refresh tokens
    pub refresh_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 10 days)
    pub refresh_token_expiry: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Secret for signing access tokens
    /// - `REFRESH_TOKEN_SECRET`: Secret for signing refresh tokens (must differ)
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 864000)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;

        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        if access_secret.is_empty() || refresh_secret.is_empty() {
            anyhow::bail!("Token secrets must not be empty");
        }
        if access_secret == refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "864000".to_string()) // 10 days
            .parse()
            .unwrap_or(864000);

        Ok(JwtConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    pub handle: String,
    pub display_name: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    pub token_type: TokenType,
}

/// Refresh token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub sub: Uuid,
    pub iat: u64,
    pub exp: u64,
    /// Unique per issuance, so two tokens minted in the same second differ
    pub jti: Uuid,
    pub token_type: TokenType,
}

pub(crate) fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
///
/// Built once at start-up and cloned into handler state; it holds no mutable
/// state.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl TokenService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Generate an access token for a user
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        self.issue_access_token_at(user, now_secs()?)
    }

    pub(crate) fn issue_access_token_at(&self, user: &User, issued_at: u64) -> Result<String> {
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            handle: user.handle.clone(),
            display_name: user.display_name.clone(),
            iat: issued_at,
            exp: issued_at + self.config.access_token_expiry,
            token_type: TokenType::Access,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.access_encoding,
        )?)
    }

    /// Generate a refresh token for a user
    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        self.issue_refresh_token_at(user, now_secs()?)
    }

    pub(crate) fn issue_refresh_token_at(&self, user: &User, issued_at: u64) -> Result<String> {
        let claims = RefreshClaims {
            sub: user.id,
            iat: issued_at,
            exp: issued_at + self.config.refresh_token_expiry,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding,
        )?)
    }

    /// Validate an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims = decode::<AccessClaims>(token, &self.access_decoding, &self.validation)
            .map_err(|e| {
                debug!("Access token rejected: {}", e);
                AuthError::Unauthorized
            })?
            .claims;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    /// Validate a refresh token's signature, expiry and type
    pub fn verify_refresh_token(&self, token: &str) -> AuthResult<RefreshClaims> {
        let claims = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map_err(|e| {
                debug!("Refresh token rejected: {}", e);
                AuthError::Unauthorized
            })?
            .claims;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    /// Digest under which a refresh token is persisted
    pub fn hash_refresh_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> JwtConfig {
    JwtConfig {
        access_secret: "access-secret-for-tests".to_string(),
        refresh_secret: "refresh-secret-for-tests".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 864000,
    }
}

#[cfg(test)]
pub(crate) fn test_user() -> User {
    use chrono::Utc;
    use common::models::PasswordHash;

    User {
        id: Uuid::new_v4(),
        handle: "alice".to_string(),
        email: "alice@example.com".to_string(),
        display_name: "Alice".to_string(),
        avatar: "https://cdn.example.com/alice.png".to_string(),
        cover_image: None,
        password_hash: PasswordHash::from_phc("$argon2id$stub".to_string()),
        refresh_token_hash: None,
        watch_history: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
