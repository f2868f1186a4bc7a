//! Videos, channel listings and watch history

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use common::{
    RecordStore, SharedStore,
    models::{Like, LikeTargetKind, NewVideo, User, Video, VideoChanges},
};

use crate::{
    error::{ApiError, ApiResult},
    models::{PublishVideoRequest, UpdateVideoRequest, VideoView},
    pipeline::{Page, Query, Relation, SortDirection, lookup, paginate},
};

fn not_found() -> ApiError {
    ApiError::NotFound("Video not found".to_string())
}

/// Unpublished videos exist only for their owner
pub(crate) fn visible_to(video: &Video, viewer: Option<Uuid>) -> bool {
    video.is_published || viewer == Some(video.owner_id)
}

fn required(field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(field: &str, value: Option<String>) -> ApiResult<Option<String>> {
    value.map(|value| required(field, &value)).transpose()
}

/// Owners and likes for a batch of videos, loaded with one store call each
struct VideoStats {
    owners: Relation<User>,
    likes: Relation<Like>,
}

impl VideoStats {
    async fn load(store: &dyn RecordStore, videos: &[Video]) -> ApiResult<Self> {
        Ok(Self {
            owners: lookup::users(store, videos.iter().map(|v| v.owner_id)).await?,
            likes: lookup::likes(store, LikeTargetKind::Video, videos.iter().map(|v| v.id))
                .await?,
        })
    }

    fn view(&self, video: Video, viewer: Option<Uuid>) -> VideoView {
        let owner = self.owners.denormalize(video.owner_id);
        let likes_count = self.likes.count(video.id);
        let is_liked = self.likes.contains(video.id, viewer, |like| like.liked_by);
        VideoView::new(video, owner, likes_count, is_liked)
    }
}

/// Attach owner summaries and like statistics to a page of videos
async fn enrich(
    store: &dyn RecordStore,
    page: Page<Video>,
    viewer: Option<Uuid>,
) -> ApiResult<Page<VideoView>> {
    let stats = VideoStats::load(store, &page.items).await?;
    Ok(page.map(|video| stats.view(video, viewer)))
}

/// Video operations
#[derive(Clone)]
pub struct VideoService {
    store: SharedStore,
}

impl VideoService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn publish(&self, owner_id: Uuid, request: PublishVideoRequest) -> ApiResult<Video> {
        let new_video = NewVideo {
            video_file: required("Video file", &request.video_file)?,
            thumbnail: required("Thumbnail", &request.thumbnail)?,
            title: required("Title", &request.title)?,
            description: required("Description", &request.description)?,
            duration: request.duration,
            is_published: request.is_published.unwrap_or(true),
            owner_id,
        };
        if !new_video.duration.is_finite() || new_video.duration < 0.0 {
            return Err(ApiError::Validation(
                "Duration must be a non-negative number".to_string(),
            ));
        }

        let video = self.store.insert_video(new_video).await?;
        info!("User {} published video {}", owner_id, video.id);
        Ok(video)
    }

    /// A single video with owner and like statistics
    pub async fn get(&self, video_id: Uuid, viewer: Option<Uuid>) -> ApiResult<VideoView> {
        let store = self.store.as_ref();
        let video = store
            .find_video(video_id)
            .await?
            .filter(|video| visible_to(video, viewer))
            .ok_or_else(not_found)?;

        let stats = VideoStats::load(store, std::slice::from_ref(&video)).await?;
        Ok(stats.view(video, viewer))
    }

    async fn owned_video(&self, user_id: Uuid, video_id: Uuid) -> ApiResult<Video> {
        let video = self
            .store
            .find_video(video_id)
            .await?
            .ok_or_else(not_found)?;

        if video.owner_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the owner can modify this video".to_string(),
            ));
        }
        Ok(video)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        request: UpdateVideoRequest,
    ) -> ApiResult<Video> {
        let changes = VideoChanges {
            title: optional("Title", request.title)?,
            description: optional("Description", request.description)?,
            thumbnail: optional("Thumbnail", request.thumbnail)?,
            is_published: None,
        };
        self.owned_video(user_id, video_id).await?;

        self.store
            .update_video(video_id, changes)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn toggle_publish(&self, user_id: Uuid, video_id: Uuid) -> ApiResult<Video> {
        let video = self.owned_video(user_id, video_id).await?;

        let changes = VideoChanges {
            is_published: Some(!video.is_published),
            ..Default::default()
        };
        self.store
            .update_video(video_id, changes)
            .await?
            .ok_or_else(not_found)
    }

    /// Delete a video with its comments and all likes on either
    pub async fn delete(&self, user_id: Uuid, video_id: Uuid) -> ApiResult<()> {
        self.owned_video(user_id, video_id).await?;

        if !self.store.delete_video(video_id).await? {
            return Err(not_found());
        }

        info!("User {} deleted video {}", user_id, video_id);
        Ok(())
    }

    /// Count a view and move the video to the end of the viewer's history
    pub async fn record_view(&self, viewer_id: Uuid, video_id: Uuid) -> ApiResult<Video> {
        let visible = self
            .store
            .find_video(video_id)
            .await?
            .is_some_and(|video| visible_to(&video, Some(viewer_id)));
        if !visible {
            return Err(not_found());
        }

        let video = self
            .store
            .increment_views(video_id)
            .await?
            .ok_or_else(not_found)?;
        self.store.push_watch_history(viewer_id, video_id).await?;

        Ok(video)
    }

    /// A page of a channel's videos, newest first; unpublished videos are
    /// only listed for the channel owner
    pub async fn videos_for_channel(
        &self,
        channel_id: Uuid,
        viewer: Option<Uuid>,
        page: u64,
        page_size: u64,
    ) -> ApiResult<Page<VideoView>> {
        let store = self.store.as_ref();
        if store.find_user(channel_id).await?.is_none() {
            return Err(ApiError::NotFound("Channel not found".to_string()));
        }

        let rows = store.videos_by_owner(channel_id).await?;
        let query = Query::from_rows(rows)
            .filter(|video| video.owner_id == channel_id && visible_to(video, viewer))
            .sort_by(|video| (video.created_at, video.id), SortDirection::Descending);

        enrich(store, paginate(query, page, page_size)?, viewer).await
    }

    /// A page of the viewer's watch history, most recently watched first
    pub async fn watch_history(
        &self,
        viewer_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> ApiResult<Page<VideoView>> {
        let store = self.store.as_ref();
        let user = store
            .find_user(viewer_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        let position: HashMap<Uuid, usize> = user
            .watch_history
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let rows = store.find_videos(&user.watch_history).await?;
        let query = Query::from_rows(rows)
            .filter(|video| position.contains_key(&video.id))
            .sort_by(
                |video| position.get(&video.id).copied(),
                SortDirection::Descending,
            );

        enrich(store, paginate(query, page, page_size)?, Some(viewer_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comments::{CommentService, CommentsForVideo},
        likes::LikeService,
        test_support::{Fixture, fixture, video},
    };
    use common::models::{LikeTarget, NewComment};

    fn request(title: &str) -> PublishVideoRequest {
        PublishVideoRequest {
            video_file: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail: "https://cdn.example.com/v.jpg".to_string(),
            title: title.to_string(),
            description: "Description".to_string(),
            duration: 12.5,
            is_published: None,
        }
    }

    #[tokio::test]
    async fn test_publish_validates_fields() {
        let Fixture { store, alice, .. } = fixture().await;
        let videos = VideoService::new(store);

        let published = videos.publish(alice.id, request(" Hello ")).await.unwrap();
        assert_eq!(published.title, "Hello");
        assert!(published.is_published);
        assert_eq!(published.views, 0);

        assert!(matches!(
            videos.publish(alice.id, request("  ")).await,
            Err(ApiError::Validation(_))
        ));

        let mut negative = request("Negative");
        negative.duration = -1.0;
        assert!(matches!(
            videos.publish(alice.id, negative).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_includes_owner_and_likes() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let videos = VideoService::new(store.clone());
        store.insert_like(bob.id, LikeTarget::Video(video.id)).await.unwrap();

        let view = videos.get(video.id, Some(bob.id)).await.unwrap();
        assert_eq!(view.likes_count, 1);
        assert!(view.is_liked);
        assert_eq!(view.owner.unwrap().id, alice.id);

        let anonymous = videos.get(video.id, None).await.unwrap();
        assert!(!anonymous.is_liked);
    }

    #[tokio::test]
    async fn test_unpublished_video_is_visible_only_to_owner() {
        let Fixture { store, alice, bob, .. } = fixture().await;
        let videos = VideoService::new(store.clone());
        let draft = video(&store, alice.id, "draft", false).await;

        assert!(videos.get(draft.id, Some(alice.id)).await.is_ok());
        assert!(matches!(
            videos.get(draft.id, Some(bob.id)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            videos.record_view(bob.id, draft.id).await,
            Err(ApiError::NotFound(_))
        ));

        let for_owner = videos
            .videos_for_channel(alice.id, Some(alice.id), 1, 10)
            .await
            .unwrap();
        assert_eq!(for_owner.total_items, 2);
        assert_eq!(for_owner.items[0].id, draft.id);

        let for_others = videos
            .videos_for_channel(alice.id, None, 1, 10)
            .await
            .unwrap();
        assert_eq!(for_others.total_items, 1);
    }

    #[tokio::test]
    async fn test_draft_cannot_be_commented_or_liked_by_others() {
        let Fixture { store, alice, bob, .. } = fixture().await;
        let comments = CommentService::new(store.clone());
        let likes = LikeService::new(store.clone());
        let draft = video(&store, alice.id, "draft", false).await;
        let by_owner = comments.add(alice.id, draft.id, "note to self").await.unwrap();

        assert!(matches!(
            comments.add(bob.id, draft.id, "sneaky").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            comments
                .comments_for_video(CommentsForVideo {
                    video_id: draft.id,
                    viewer: Some(bob.id),
                    page: 1,
                    page_size: 10,
                })
                .await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            likes.toggle(bob.id, LikeTarget::Video(draft.id)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            likes.toggle(bob.id, LikeTarget::Comment(by_owner.id)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(store
            .likes_for(LikeTargetKind::Video, &[draft.id])
            .await
            .unwrap()
            .is_empty());

        // The owner still sees and interacts with the draft
        let own_view = comments
            .comments_for_video(CommentsForVideo {
                video_id: draft.id,
                viewer: Some(alice.id),
                page: 1,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(own_view.total_items, 1);
        assert!(likes.toggle(alice.id, LikeTarget::Video(draft.id)).await.unwrap().liked);
    }

    #[tokio::test]
    async fn test_only_owner_can_modify() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let videos = VideoService::new(store);

        let update = UpdateVideoRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            videos.update(bob.id, video.id, update.clone()).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            videos.toggle_publish(bob.id, video.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            videos.delete(bob.id, video.id).await,
            Err(ApiError::Forbidden(_))
        ));

        let renamed = videos.update(alice.id, video.id, update).await.unwrap();
        assert_eq!(renamed.title, "Renamed");
        assert_eq!(renamed.description, video.description);

        let hidden = videos.toggle_publish(alice.id, video.id).await.unwrap();
        assert!(!hidden.is_published);
    }

    #[tokio::test]
    async fn test_delete_cascades_comments_and_likes() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let videos = VideoService::new(store.clone());
        let comment = store
            .insert_comment(NewComment {
                content: "nice".to_string(),
                video_id: video.id,
                owner_id: bob.id,
            })
            .await
            .unwrap();
        store.insert_like(bob.id, LikeTarget::Video(video.id)).await.unwrap();
        store
            .insert_like(alice.id, LikeTarget::Comment(comment.id))
            .await
            .unwrap();

        videos.delete(alice.id, video.id).await.unwrap();

        assert!(store.find_video(video.id).await.unwrap().is_none());
        assert!(store.find_comment(comment.id).await.unwrap().is_none());
        assert!(store
            .likes_for(LikeTargetKind::Video, &[video.id])
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .likes_for(LikeTargetKind::Comment, &[comment.id])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_watch_history_is_most_recent_first() {
        let Fixture { store, alice, bob, video } = fixture().await;
        let videos = VideoService::new(store.clone());
        let second = crate::test_support::video(&store, alice.id, "second", true).await;

        videos.record_view(bob.id, video.id).await.unwrap();
        videos.record_view(bob.id, second.id).await.unwrap();
        let rewatched = videos.record_view(bob.id, video.id).await.unwrap();
        assert_eq!(rewatched.views, 2);

        let history = videos.watch_history(bob.id, 1, 10).await.unwrap();
        let ids: Vec<Uuid> = history.items.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![video.id, second.id]);
        assert_eq!(history.items[0].owner.as_ref().unwrap().handle, "alice");
    }
}
