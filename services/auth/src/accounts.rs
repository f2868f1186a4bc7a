//! Account operations: registration, login and profile changes
//!
//! Every write to a user record goes through [`AccountService::save_changes`],
//! which hashes a password only when a new plaintext one is supplied.
//! Saving without a password leaves the stored hash untouched.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    models::{LoginRequest, RegisterRequest, UpdateAccountRequest},
    password::CredentialStore,
    session::{SessionManager, TokenPair},
    validation,
};
use common::{
    SharedStore,
    models::{NewUser, User, UserChanges},
};

/// Changes requested on an account, with the password still in plaintext
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub new_password: Option<String>,
}

/// Account service
#[derive(Clone)]
pub struct AccountService {
    store: SharedStore,
    credentials: CredentialStore,
    sessions: SessionManager,
}

impl AccountService {
    /// Create a new account service
    pub fn new(store: SharedStore, credentials: CredentialStore, sessions: SessionManager) -> Self {
        Self {
            store,
            credentials,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        let handle = validation::normalize_identifier(&request.handle);
        let email = validation::normalize_identifier(&request.email);
        let display_name = request.display_name.trim().to_string();

        validation::validate_handle(&handle).map_err(AuthError::Validation)?;
        validation::validate_email(&email).map_err(AuthError::Validation)?;
        validation::validate_display_name(&display_name).map_err(AuthError::Validation)?;
        validation::validate_required("Avatar", &request.avatar).map_err(AuthError::Validation)?;
        validation::validate_password(&request.password).map_err(AuthError::Validation)?;

        info!("Registering user: {}", handle);

        if self.store.find_user_by_login(&handle).await?.is_some()
            || self.store.find_user_by_login(&email).await?.is_some()
        {
            return Err(AuthError::Conflict(
                "User with this handle or email already exists".to_string(),
            ));
        }

        let password_hash = self
            .credentials
            .hash_password(&request.password)
            .map_err(AuthError::Internal)?;

        let user = self
            .store
            .insert_user(NewUser {
                handle,
                email,
                display_name,
                avatar: request.avatar.trim().to_string(),
                cover_image: request
                    .cover_image
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                password_hash,
            })
            .await?;

        Ok(user)
    }

    /// Verify credentials and start a session
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, TokenPair)> {
        let login = validation::normalize_identifier(&request.handle_or_email);
        if login.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Handle or email and password are required".to_string(),
            ));
        }

        info!("Login attempt for user: {}", login);

        let Some(user) = self.store.find_user_by_login(&login).await? else {
            self.credentials.verify_absent_account(&request.password);
            return Err(AuthError::Unauthorized);
        };

        if !self
            .credentials
            .verify_password(&request.password, &user.password_hash)
        {
            warn!("Invalid password for user: {}", user.id);
            return Err(AuthError::Unauthorized);
        }

        let tokens = self.sessions.start_session(&user).await?;
        Ok((user, tokens))
    }

    /// Load the account behind an authenticated identity
    pub async fn current_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    /// Update display name and/or email
    pub async fn update_details(
        &self,
        user_id: Uuid,
        request: UpdateAccountRequest,
    ) -> AuthResult<User> {
        if request.display_name.is_none() && request.email.is_none() {
            return Err(AuthError::Validation(
                "Provide a display name or an email to update".to_string(),
            ));
        }

        let display_name = match request.display_name {
            Some(name) => {
                validation::validate_display_name(&name).map_err(AuthError::Validation)?;
                Some(name.trim().to_string())
            }
            None => None,
        };

        let email = match request.email {
            Some(email) => {
                let email = validation::normalize_identifier(&email);
                validation::validate_email(&email).map_err(AuthError::Validation)?;
                Some(email)
            }
            None => None,
        };

        self.save_changes(
            user_id,
            AccountChanges {
                email,
                display_name,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_avatar(&self, user_id: Uuid, avatar: &str) -> AuthResult<User> {
        validation::validate_required("Avatar", avatar).map_err(AuthError::Validation)?;
        self.save_changes(
            user_id,
            AccountChanges {
                avatar: Some(avatar.trim().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_cover_image(&self, user_id: Uuid, cover_image: &str) -> AuthResult<User> {
        validation::validate_required("Cover image", cover_image)
            .map_err(AuthError::Validation)?;
        self.save_changes(
            user_id,
            AccountChanges {
                cover_image: Some(cover_image.trim().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Change the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self.current_user(user_id).await?;

        if !self
            .credentials
            .verify_password(old_password, &user.password_hash)
        {
            return Err(AuthError::Validation("Invalid old password".to_string()));
        }
        validation::validate_password(new_password).map_err(AuthError::Validation)?;

        self.save_changes(
            user_id,
            AccountChanges {
                new_password: Some(new_password.to_string()),
                ..Default::default()
            },
        )
        .await?;

        info!("Password changed for user: {}", user_id);
        Ok(())
    }

    /// Persist account changes, hashing the password only if one was given
    pub async fn save_changes(&self, user_id: Uuid, changes: AccountChanges) -> AuthResult<User> {
        let password_hash = match changes.new_password {
            Some(plaintext) => Some(
                self.credentials
                    .hash_password(&plaintext)
                    .map_err(AuthError::Internal)?,
            ),
            None => None,
        };

        self.store
            .update_user(
                user_id,
                UserChanges {
                    email: changes.email,
                    display_name: changes.display_name,
                    avatar: changes.avatar,
                    cover_image: changes.cover_image,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }
}
