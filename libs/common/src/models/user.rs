//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// One-way password digest in PHC string format
///
/// Values come either from the credential store or from a persisted record,
/// so a plaintext password never reaches a write path typed as a hash.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded PHC string produced by a password hasher
    pub fn from_phc(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: PasswordHash,
}

/// User update payload
///
/// `None` leaves the stored column untouched; in particular the stored
/// password hash is only replaced when a fresh hash is supplied.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: Option<PasswordHash>,
}

/// Public projection of a user, safe to embed in any response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub avatar: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            handle: user.handle.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_camel_case_without_credentials() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            handle: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            avatar: "https://cdn.example.com/alice.png".to_string(),
            cover_image: Some("https://cdn.example.com/cover.png".to_string()),
            password_hash: PasswordHash::from_phc("$argon2id$secret".to_string()),
            refresh_token_hash: Some("digest".to_string()),
            watch_history: vec![Uuid::new_v4()],
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["displayName"], "Alice");
        assert_eq!(value["coverImage"], "https://cdn.example.com/cover.png");
        assert!(value["watchHistory"].is_array());
        assert!(value["createdAt"].is_string());
        assert!(value.get("display_name").is_none());
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("refreshTokenHash").is_none());
    }
}
