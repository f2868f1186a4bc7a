//! Likes on videos and comments

use tracing::info;
use uuid::Uuid;

use common::{SharedStore, models::LikeTarget};

use crate::{
    error::{ApiError, ApiResult},
    models::LikeStatus,
    videos::visible_to,
};

/// Like operations
#[derive(Clone)]
pub struct LikeService {
    store: SharedStore,
}

impl LikeService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The target must exist and, directly or through its comment, belong
    /// to a video the user can see
    async fn ensure_target_visible(&self, user_id: Uuid, target: LikeTarget) -> ApiResult<()> {
        let video_id = match target {
            LikeTarget::Video(id) => id,
            LikeTarget::Comment(id) => {
                self.store
                    .find_comment(id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?
                    .video_id
            }
        };

        let visible = self
            .store
            .find_video(video_id)
            .await?
            .is_some_and(|video| visible_to(&video, Some(user_id)));
        if !visible {
            return Err(ApiError::NotFound("Video not found".to_string()));
        }
        Ok(())
    }

    /// Like the target, or remove the like if the user already liked it
    pub async fn toggle(&self, user_id: Uuid, target: LikeTarget) -> ApiResult<LikeStatus> {
        self.ensure_target_visible(user_id, target).await?;

        let liked = match self.store.find_like(user_id, target).await? {
            Some(existing) => {
                self.store.delete_like(existing.id).await?;
                false
            }
            None => {
                self.store.insert_like(user_id, target).await?;
                true
            }
        };

        info!("User {} set like on {:?} to {}", user_id, target, liked);
        Ok(LikeStatus { target, liked })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, fixture};
    use common::models::LikeTargetKind;

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let Fixture { store, bob, video, .. } = fixture().await;
        let likes = LikeService::new(store.clone());
        let target = LikeTarget::Video(video.id);

        assert!(likes.toggle(bob.id, target).await.unwrap().liked);
        assert_eq!(
            store
                .likes_for(LikeTargetKind::Video, &[video.id])
                .await
                .unwrap()
                .len(),
            1
        );

        assert!(!likes.toggle(bob.id, target).await.unwrap().liked);
        assert!(store
            .likes_for(LikeTargetKind::Video, &[video.id])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_toggle_on_missing_target_is_not_found() {
        let Fixture { store, bob, .. } = fixture().await;
        let likes = LikeService::new(store);

        assert!(matches!(
            likes.toggle(bob.id, LikeTarget::Comment(Uuid::new_v4())).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
