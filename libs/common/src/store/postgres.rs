//! PostgreSQL record store
//!
//! Cascading deletes are delegated to the `ON DELETE CASCADE` foreign keys
//! declared in the migrations, so each delete is a single statement.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::RecordStore;
use crate::{
    error::{DatabaseError, DatabaseResult},
    models::{
        Comment, Like, LikeTarget, LikeTargetKind, NewComment, NewUser, NewVideo, Subscription,
        User, UserChanges, Video, VideoChanges, like::LikeRow,
    },
};

const USER_COLUMNS: &str = "id, handle, email, display_name, avatar, cover_image, password_hash, \
     refresh_token_hash, watch_history, created_at, updated_at";

const VIDEO_COLUMNS: &str = "id, video_file, thumbnail, title, description, duration, views, \
     is_published, owner_id, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, content, video_id, owner_id, created_at, updated_at";

const LIKE_COLUMNS: &str = "id, video_id, comment_id, liked_by, created_at";

const SUBSCRIPTION_COLUMNS: &str = "id, subscriber_id, channel_id, created_at";

fn into_likes(rows: Vec<LikeRow>) -> DatabaseResult<Vec<Like>> {
    rows.into_iter().map(into_like).collect()
}

fn into_like(row: LikeRow) -> DatabaseResult<Like> {
    Like::try_from(row).map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))
}

/// Record store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PostgreSQL store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_user(&self, new_user: NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.handle);

        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (handle, email, display_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.handle)
        .bind(&new_user.email)
        .bind(&new_user.display_name)
        .bind(&new_user.avatar)
        .bind(&new_user.cover_image)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_user(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_user_by_handle(&self, handle: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE handle = $1"
        ))
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_user_by_login(&self, handle_or_email: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by handle or email: {}", handle_or_email);

        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE handle = $1 OR email = $1"
        ))
        .bind(handle_or_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                display_name = COALESCE($3, display_name),
                avatar = COALESCE($4, avatar),
                cover_image = COALESCE($5, cover_image),
                password_hash = COALESCE($6, password_hash),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.display_name)
        .bind(&changes.avatar)
        .bind(&changes.cover_image)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: Option<&str>,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() == 1)
    }

    async fn push_watch_history(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET watch_history = array_append(array_remove(watch_history, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;
        Ok(())
    }

    async fn insert_video(&self, new_video: NewVideo) -> DatabaseResult<Video> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (video_file, thumbnail, title, description, duration, is_published, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(&new_video.video_file)
        .bind(&new_video.thumbnail)
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(new_video.duration)
        .bind(new_video.is_published)
        .bind(new_video.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_video(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_videos(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Video>> {
        sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn videos_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<Video>> {
        sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update_video(
        &self,
        id: Uuid,
        changes: VideoChanges,
    ) -> DatabaseResult<Option<Video>> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail = COALESCE($4, thumbnail),
                is_published = COALESCE($5, is_published),
                updated_at = now()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.thumbnail)
        .bind(changes.is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        sqlx::query_as::<_, Video>(&format!(
            "UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete_video(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, new_comment: NewComment) -> DatabaseResult<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (content, video_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(&new_comment.content)
        .bind(new_comment.video_id)
        .bind(new_comment.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_comment(&self, id: Uuid) -> DatabaseResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn comments_for_video(&self, video_id: Uuid) -> DatabaseResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE video_id = $1"
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> DatabaseResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET content = $2, updated_at = now()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete_comment(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Option<Like>> {
        let column = match target.kind() {
            LikeTargetKind::Video => "video_id",
            LikeTargetKind::Comment => "comment_id",
        };

        let row = sqlx::query_as::<_, LikeRow>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE liked_by = $1 AND {column} = $2"
        ))
        .bind(liked_by)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.map(into_like).transpose()
    }

    async fn insert_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Like> {
        let (video_id, comment_id) = match target {
            LikeTarget::Video(id) => (Some(id), None),
            LikeTarget::Comment(id) => (None, Some(id)),
        };

        let row = sqlx::query_as::<_, LikeRow>(&format!(
            r#"
            INSERT INTO likes (video_id, comment_id, liked_by)
            VALUES ($1, $2, $3)
            RETURNING {LIKE_COLUMNS}
            "#
        ))
        .bind(video_id)
        .bind(comment_id)
        .bind(liked_by)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        into_like(row)
    }

    async fn delete_like(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(result.rows_affected() > 0)
    }

    async fn likes_for(
        &self,
        kind: LikeTargetKind,
        target_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Like>> {
        let column = match kind {
            LikeTargetKind::Video => "video_id",
            LikeTargetKind::Comment => "comment_id",
        };

        let rows = sqlx::query_as::<_, LikeRow>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE {column} = ANY($1)"
        ))
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        into_likes(rows)
    }

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2"
        ))
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn insert_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Subscription> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete_subscription(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(result.rows_affected() > 0)
    }

    async fn subscriptions_to(&self, channel_ids: &[Uuid]) -> DatabaseResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE channel_id = ANY($1)"
        ))
        .bind(channel_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn subscriptions_by(
        &self,
        subscriber_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscriber_id = ANY($1)"
        ))
        .bind(subscriber_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}
