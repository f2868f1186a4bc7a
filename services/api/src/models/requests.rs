//! Request payloads

use serde::Deserialize;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u64 = 100;

const DEFAULT_PAGE_SIZE: u64 = 10;

/// Query parameters for paginated listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u64>,
    /// Number of items per page
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Comment creation or edit payload
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// New video payload; the media files are referenced, not uploaded
#[derive(Debug, Clone, Deserialize)]
pub struct PublishVideoRequest {
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: Option<bool>,
}

/// Video details update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}
