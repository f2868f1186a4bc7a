//! Comments on videos

use tracing::info;
use uuid::Uuid;

use common::{
    SharedStore,
    models::{Comment, LikeTargetKind, NewComment},
};

use crate::{
    error::{ApiError, ApiResult},
    models::CommentView,
    pipeline::{Page, Query, SortDirection, lookup, paginate},
    videos::visible_to,
};

/// Input of the comments-for-video pipeline
#[derive(Debug, Clone, Copy)]
pub struct CommentsForVideo {
    pub video_id: Uuid,
    pub viewer: Option<Uuid>,
    pub page: u64,
    pub page_size: u64,
}

fn validate_content(content: &str) -> ApiResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation(
            "Comment content is required".to_string(),
        ));
    }
    Ok(content.to_string())
}

/// Comment operations
#[derive(Clone)]
pub struct CommentService {
    store: SharedStore,
}

impl CommentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// A page of a video's comments, newest first, each with its owner,
    /// like count and whether the viewer liked it
    pub async fn comments_for_video(
        &self,
        input: CommentsForVideo,
    ) -> ApiResult<Page<CommentView>> {
        let store = self.store.as_ref();

        let visible = store
            .find_video(input.video_id)
            .await?
            .is_some_and(|video| visible_to(&video, input.viewer));
        if !visible {
            return Err(ApiError::NotFound("Video not found".to_string()));
        }

        let rows = store.comments_for_video(input.video_id).await?;
        let query = Query::from_rows(rows)
            .filter(|comment| comment.video_id == input.video_id)
            .sort_by(
                |comment| (comment.created_at, comment.id),
                SortDirection::Descending,
            );
        let page = paginate(query, input.page, input.page_size)?;

        let owners = lookup::users(store, page.items.iter().map(|c| c.owner_id)).await?;
        let likes = lookup::likes(
            store,
            LikeTargetKind::Comment,
            page.items.iter().map(|c| c.id),
        )
        .await?;

        Ok(page.map(|comment| CommentView {
            id: comment.id,
            likes_count: likes.count(comment.id),
            is_liked: likes.contains(comment.id, input.viewer, |like| like.liked_by),
            owner: owners.denormalize(comment.owner_id),
            content: comment.content,
            created_at: comment.created_at,
        }))
    }

    pub async fn add(&self, owner_id: Uuid, video_id: Uuid, content: &str) -> ApiResult<Comment> {
        let content = validate_content(content)?;

        let visible = self
            .store
            .find_video(video_id)
            .await?
            .is_some_and(|video| visible_to(&video, Some(owner_id)));
        if !visible {
            return Err(ApiError::NotFound("Video not found".to_string()));
        }

        let comment = self
            .store
            .insert_comment(NewComment {
                content,
                video_id,
                owner_id,
            })
            .await?;

        info!("User {} commented {} on video {}", owner_id, comment.id, video_id);
        Ok(comment)
    }

    async fn owned_comment(&self, user_id: Uuid, comment_id: Uuid) -> ApiResult<Comment> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

        if comment.owner_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the owner can modify this comment".to_string(),
            ));
        }
        Ok(comment)
    }

    pub async fn update(&self, user_id: Uuid, comment_id: Uuid, content: &str) -> ApiResult<Comment> {
        let content = validate_content(content)?;
        self.owned_comment(user_id, comment_id).await?;

        self.store
            .update_comment(comment_id, &content)
            .await?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
    }

    /// Delete a comment and every like on it
    pub async fn delete(&self, user_id: Uuid, comment_id: Uuid) -> ApiResult<()> {
        self.owned_comment(user_id, comment_id).await?;

        if !self.store.delete_comment(comment_id).await? {
            return Err(ApiError::NotFound("Comment not found".to_string()));
        }

        info!("User {} deleted comment {}", user_id, comment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, fixture};
    use common::models::LikeTarget;

    fn first_page(video_id: Uuid, viewer: Option<Uuid>) -> CommentsForVideo {
        CommentsForVideo {
            video_id,
            viewer,
            page: 1,
            page_size: 10,
        }
    }

    #[tokio::test]
    async fn test_comment_views_carry_owner_likes_and_viewer_flag() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let comments = CommentService::new(store.clone());

        let c1 = comments.add(alice.id, video.id, "first").await.unwrap();
        let c2 = comments.add(bob.id, video.id, "second").await.unwrap();
        store.insert_like(bob.id, LikeTarget::Comment(c1.id)).await.unwrap();
        store.insert_like(alice.id, LikeTarget::Comment(c1.id)).await.unwrap();

        let page = comments
            .comments_for_video(first_page(video.id, Some(bob.id)))
            .await
            .unwrap();

        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].id, c2.id);
        assert_eq!(page.items[0].likes_count, 0);
        assert!(!page.items[0].is_liked);
        assert_eq!(page.items[1].id, c1.id);
        assert_eq!(page.items[1].likes_count, 2);
        assert!(page.items[1].is_liked);
        assert_eq!(page.items[1].owner.as_ref().unwrap().handle, "alice");

        let anonymous = comments
            .comments_for_video(first_page(video.id, None))
            .await
            .unwrap();
        assert!(anonymous.items.iter().all(|c| !c.is_liked));
    }

    #[tokio::test]
    async fn test_comments_paginate_newest_first() {
        let Fixture { store, alice, video, .. } = fixture().await;
        let comments = CommentService::new(store);

        for n in 1..=25 {
            comments
                .add(alice.id, video.id, &format!("comment {n}"))
                .await
                .unwrap();
        }

        let page = comments
            .comments_for_video(CommentsForVideo {
                video_id: video.id,
                viewer: None,
                page: 3,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].content, "comment 5");
        assert_eq!(page.items[4].content, "comment 1");

        let beyond = comments
            .comments_for_video(CommentsForVideo {
                video_id: video.id,
                viewer: None,
                page: 5,
                page_size: 10,
            })
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let Fixture { store, alice, .. } = fixture().await;
        let comments = CommentService::new(store);

        assert!(matches!(
            comments.comments_for_video(first_page(Uuid::new_v4(), None)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            comments.add(alice.id, Uuid::new_v4(), "hello").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let Fixture { store, alice, video, .. } = fixture().await;
        let comments = CommentService::new(store);

        assert!(matches!(
            comments.add(alice.id, video.id, "   ").await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_can_edit_or_delete() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let comments = CommentService::new(store.clone());
        let comment = comments.add(alice.id, video.id, "mine").await.unwrap();

        assert!(matches!(
            comments.update(bob.id, comment.id, "hijacked").await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            comments.delete(bob.id, comment.id).await,
            Err(ApiError::Forbidden(_))
        ));
        let unchanged = store.find_comment(comment.id).await.unwrap().unwrap();
        assert_eq!(unchanged.content, "mine");

        let edited = comments.update(alice.id, comment.id, "edited").await.unwrap();
        assert_eq!(edited.content, "edited");
    }

    #[tokio::test]
    async fn test_delete_cascades_likes() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let comments = CommentService::new(store.clone());
        let comment = comments.add(alice.id, video.id, "bye").await.unwrap();
        store
            .insert_like(bob.id, LikeTarget::Comment(comment.id))
            .await
            .unwrap();

        comments.delete(alice.id, comment.id).await.unwrap();

        assert!(store.find_comment(comment.id).await.unwrap().is_none());
        let likes = store
            .likes_for(LikeTargetKind::Comment, &[comment.id])
            .await
            .unwrap();
        assert!(likes.is_empty());
        assert!(matches!(
            comments.delete(alice.id, comment.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
