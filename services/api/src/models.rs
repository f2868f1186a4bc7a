//! Request payloads and response views for the API service

pub mod requests;
pub mod views;

pub use requests::{
    CommentRequest, PageQuery, PublishVideoRequest, UpdateVideoRequest,
};
pub use views::{
    ChannelProfile, CommentView, LikeStatus, SubscriberView, SubscriptionStatus, VideoView,
};
