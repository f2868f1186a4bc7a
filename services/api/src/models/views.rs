//! Response views assembled by the pipelines
//!
//! Owners are embedded as [`UserSummary`], which carries no credential
//! fields. An owner that no longer exists is rendered as `null`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use common::models::{LikeTarget, UserSummary, Video};

/// A comment with its owner and like statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub owner: Option<UserSummary>,
    pub is_liked: bool,
}

/// A video with its owner and like statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<UserSummary>,
    pub likes_count: u64,
    pub is_liked: bool,
}

impl VideoView {
    pub fn new(video: Video, owner: Option<UserSummary>, likes_count: u64, is_liked: bool) -> Self {
        Self {
            id: video.id,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            owner,
            likes_count,
            is_liked,
        }
    }
}

/// Public channel page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// One entry of a channel's subscriber list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    pub subscriber: Option<UserSummary>,
    pub subscribed_at: DateTime<Utc>,
}

/// Result of toggling a like
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub target: LikeTarget,
    pub liked: bool,
}

/// Result of toggling a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub channel_id: Uuid,
    pub subscribed: bool,
}
