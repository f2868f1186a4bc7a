//! In-memory record store
//!
//! Every table lives behind one lock, so multi-record writes (cascading
//! deletes, refresh token compare-and-swap) are atomic with respect to
//! concurrent requests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RecordStore;
use crate::{
    error::{DatabaseError, DatabaseResult},
    models::{
        Comment, Like, LikeTarget, LikeTargetKind, NewComment, NewUser, NewVideo, Subscription,
        User, UserChanges, Video, VideoChanges,
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    comments: HashMap<Uuid, Comment>,
    likes: HashMap<Uuid, Like>,
    subscriptions: HashMap<Uuid, Subscription>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps, so creation order is observable
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn remove_likes_where(&mut self, mut matches: impl FnMut(&LikeTarget) -> bool) {
        self.likes.retain(|_, like| !matches(&like.target));
    }
}

/// Record store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.handle == new_user.handle) {
            return Err(DatabaseError::UniqueViolation("users_handle_key".to_string()));
        }
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
        }

        let now = tables.now();
        let user = User {
            id: Uuid::new_v4(),
            handle: new_user.handle,
            email: new_user.email,
            display_name: new_user.display_name,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            password_hash: new_user.password_hash,
            refresh_token_hash: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_handle(&self, handle: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.handle == handle).cloned())
    }

    async fn find_user_by_login(&self, handle_or_email: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.handle == handle_or_email || u.email == handle_or_email)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> DatabaseResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> DatabaseResult<Option<User>> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
            }
        }

        let now = tables.now();
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(display_name) = changes.display_name {
            user.display_name = display_name;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        if let Some(cover_image) = changes.cover_image {
            user.cover_image = Some(cover_image);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = now;

        Ok(Some(user.clone()))
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&id) {
            user.refresh_token_hash = token_hash.map(str::to_string);
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: Option<&str>,
    ) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(expected) => {
                user.refresh_token_hash = replacement.map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn push_watch_history(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.watch_history.retain(|id| *id != video_id);
            user.watch_history.push(video_id);
        }
        Ok(())
    }

    async fn insert_video(&self, new_video: NewVideo) -> DatabaseResult<Video> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let video = Video {
            id: Uuid::new_v4(),
            video_file: new_video.video_file,
            thumbnail: new_video.thumbnail,
            title: new_video.title,
            description: new_video.description,
            duration: new_video.duration,
            views: 0,
            is_published: new_video.is_published,
            owner_id: new_video.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn find_video(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        Ok(self.tables.read().await.videos.get(&id).cloned())
    }

    async fn find_videos(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Video>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.videos.get(id).cloned())
            .collect())
    }

    async fn videos_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<Video>> {
        let tables = self.tables.read().await;
        Ok(tables
            .videos
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_video(
        &self,
        id: Uuid,
        changes: VideoChanges,
    ) -> DatabaseResult<Option<Video>> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let Some(video) = tables.videos.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            video.title = title;
        }
        if let Some(description) = changes.description {
            video.description = description;
        }
        if let Some(thumbnail) = changes.thumbnail {
            video.thumbnail = thumbnail;
        }
        if let Some(is_published) = changes.is_published {
            video.is_published = is_published;
        }
        video.updated_at = now;

        Ok(Some(video.clone()))
    }

    async fn increment_views(&self, id: Uuid) -> DatabaseResult<Option<Video>> {
        let mut tables = self.tables.write().await;
        Ok(tables.videos.get_mut(&id).map(|video| {
            video.views += 1;
            video.clone()
        }))
    }

    async fn delete_video(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.videos.remove(&id).is_none() {
            return Ok(false);
        }

        let comment_ids: Vec<Uuid> = tables
            .comments
            .values()
            .filter(|c| c.video_id == id)
            .map(|c| c.id)
            .collect();
        for comment_id in &comment_ids {
            tables.comments.remove(comment_id);
        }

        tables.remove_likes_where(|target| match target {
            LikeTarget::Video(video_id) => *video_id == id,
            LikeTarget::Comment(comment_id) => comment_ids.contains(comment_id),
        });

        Ok(true)
    }

    async fn insert_comment(&self, new_comment: NewComment) -> DatabaseResult<Comment> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: new_comment.content,
            video_id: new_comment.video_id,
            owner_id: new_comment.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> DatabaseResult<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn comments_for_video(&self, video_id: Uuid) -> DatabaseResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect())
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> DatabaseResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        Ok(tables.comments.get_mut(&id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = now;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.comments.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_likes_where(|target| *target == LikeTarget::Comment(id));
        Ok(true)
    }

    async fn find_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Option<Like>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .values()
            .find(|l| l.liked_by == liked_by && l.target == target)
            .cloned())
    }

    async fn insert_like(&self, liked_by: Uuid, target: LikeTarget) -> DatabaseResult<Like> {
        let mut tables = self.tables.write().await;
        if tables
            .likes
            .values()
            .any(|l| l.liked_by == liked_by && l.target == target)
        {
            return Err(DatabaseError::UniqueViolation("likes_target_user_uniq".to_string()));
        }

        let now = tables.now();
        let like = Like {
            id: Uuid::new_v4(),
            target,
            liked_by,
            created_at: now,
        };
        tables.likes.insert(like.id, like.clone());
        Ok(like)
    }

    async fn delete_like(&self, id: Uuid) -> DatabaseResult<bool> {
        Ok(self.tables.write().await.likes.remove(&id).is_some())
    }

    async fn likes_for(
        &self,
        kind: LikeTargetKind,
        target_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Like>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .values()
            .filter(|l| l.target.kind() == kind && target_ids.contains(&l.target.id()))
            .cloned()
            .collect())
    }

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Option<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .values()
            .find(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id)
            .cloned())
    }

    async fn insert_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> DatabaseResult<Subscription> {
        let mut tables = self.tables.write().await;
        if tables
            .subscriptions
            .values()
            .any(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id)
        {
            return Err(DatabaseError::UniqueViolation(
                "subscriptions_pair_uniq".to_string(),
            ));
        }

        let now = tables.now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            subscriber_id,
            channel_id,
            created_at: now,
        };
        tables
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn delete_subscription(&self, id: Uuid) -> DatabaseResult<bool> {
        Ok(self.tables.write().await.subscriptions.remove(&id).is_some())
    }

    async fn subscriptions_to(&self, channel_ids: &[Uuid]) -> DatabaseResult<Vec<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| channel_ids.contains(&s.channel_id))
            .cloned()
            .collect())
    }

    async fn subscriptions_by(
        &self,
        subscriber_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| subscriber_ids.contains(&s.subscriber_id))
            .cloned()
            .collect())
    }
}
