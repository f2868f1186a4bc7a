//! Application state shared across handlers

use auth::jwt::TokenService;
use common::SharedStore;

use crate::{
    channels::ChannelService, comments::CommentService, likes::LikeService, videos::VideoService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub likes: LikeService,
    pub videos: VideoService,
    pub channels: ChannelService,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: SharedStore, tokens: TokenService) -> Self {
        Self {
            comments: CommentService::new(store.clone()),
            likes: LikeService::new(store.clone()),
            videos: VideoService::new(store.clone()),
            channels: ChannelService::new(store),
            tokens,
        }
    }
}
