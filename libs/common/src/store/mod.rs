//! Record store abstraction
//!
//! Services talk to storage only through [`RecordStore`]. Two backends ship
//! with the crate: PostgreSQL for deployments and an in-memory store used by
//! tests and local development.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    database::{self, DatabaseConfig},
    error::{DatabaseError, DatabaseResult},
    models::{
        Comment, Like, LikeTarget, LikeTargetKind, NewComment, NewUser, NewVideo, Subscription,
        User, UserChanges, Video, VideoChanges,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to whichever backend was configured
pub type SharedStore = Arc<dyn RecordStore>;

/// All persistence operations used by the services
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Users

    /// Insert a user; a taken handle or email yields `UniqueViolation`
    async fn insert_user(&self, new_user: NewUser) -> DatabaseResult<User>;

    async fn find_user(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_user_by_handle(&self, handle: &str) -> DatabaseResult<Option<User>>;

    /// Look a user up by handle or email (both stored lowercase)
    async fn find_user_by_login(&self, handle_or_email: &str) -> DatabaseResult<Option<User>>;

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> DatabaseResult<Option<User>>;

    /// Unconditionally replace the persisted refresh token hash
    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DatabaseResult<()>;

    /// Replace the persisted refresh token hash only if it still equals
    /// `expected`. Returns whether the swap happened.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: Option<&str>,
    ) -> DatabaseResult<bool>;

    /// Append a video to the user's watch history, moving it to the end if
    /// it was already present
    async fn push_watch_history(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<()>;

    // Videos

    async fn insert_video(&self, new_video: NewVideo) -> DatabaseResult<Video>;

    async fn find_video(&self, id: Uuid) -> DatabaseResult<Option<Video>>;

    async fn find_videos(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Video>>;

    async fn videos_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<Video>>;

    async fn update_video(&self, id: Uuid, changes: VideoChanges)
    -> DatabaseResult<Option<Video>>;

    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>>;

    /// Delete a video together with its comments and every like pointing at
    /// the video or at one of those comments
    async fn delete_video(&self, id: Uuid) -> DatabaseResult<bool>;

    // Comments

    async fn insert_comment(&self, new_comment: NewComment) -> DatabaseResult<Comment>;

    async fn find_comment(&self, id: Uuid) -> DatabaseResult<Option<Comment>>;

    async fn comments_for_video(&self, video_id: Uuid) -> DatabaseResult<Vec<Comment>>;

    async fn update_comment(&self, id: Uuid, content: &str) -> DatabaseResult<Option<Comment>>;

    /// Delete a comment together with its likes
    async fn delete_comment(&self, id: Uuid) -> DatabaseResult<bool>;

    // Likes

    async fn find_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Option<Like>>;

    async fn insert_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Like>;

    async fn delete_like(&self, id: Uuid) -> DatabaseResult<bool>;

    /// All likes whose target is one of `target_ids` of the given kind
    async fn likes_for(
        &self,
        kind: LikeTargetKind,
        target_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Like>>;

    // Subscriptions

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Option<Subscription>>;

    async fn insert_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Subscription>;

    async fn delete_subscription(&self, id: Uuid) -> DatabaseResult<bool>;

    /// Subscriptions whose channel is one of `channel_ids`
    async fn subscriptions_to(&self, channel_ids: &[Uuid]) -> DatabaseResult<Vec<Subscription>>;

    /// Subscriptions held by one of `subscriber_ids`
    async fn subscriptions_by(&self, subscriber_ids: &[Uuid])
    -> DatabaseResult<Vec<Subscription>>;
}

/// Which backend the services should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Record store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database: DatabaseConfig,
}

impl StoreConfig {
    /// Create a new StoreConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORE_BACKEND`: `postgres` (default) or `memory`
    /// - plus everything read by [`DatabaseConfig::from_env`]
    pub fn from_env() -> DatabaseResult<Self> {
        let backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(DatabaseError::Configuration(format!(
                    "Unknown STORE_BACKEND: {}",
                    other
                )));
            }
        };

        Ok(Self {
            backend,
            database: DatabaseConfig::from_env()?,
        })
    }
}

/// Open the configured store, running migrations for PostgreSQL
pub async fn connect(config: &StoreConfig) -> DatabaseResult<SharedStore> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = database::init_pool(&config.database).await?;
            database::health_check(&pool).await?;
            database::run_migrations(&pool).await?;
            info!("Using PostgreSQL record store");
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_store_config_defaults_to_postgres() {
        unsafe {
            std::env::remove_var("STORE_BACKEND");
        }

        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.backend, StoreBackend::Postgres);
    }

    #[test]
    #[serial]
    fn test_store_config_rejects_unknown_backend() {
        unsafe {
            std::env::set_var("STORE_BACKEND", "mongo");
        }

        let result = StoreConfig::from_env();
        assert!(matches!(result, Err(DatabaseError::Configuration(_))));

        unsafe {
            std::env::set_var("STORE_BACKEND", "Memory");
        }
        assert_eq!(StoreConfig::from_env().unwrap().backend, StoreBackend::Memory);

        unsafe {
            std::env::remove_var("STORE_BACKEND");
        }
    }
}
