//! API service routes
//!
//! Every route except `/health` runs behind `optional_auth`: reads accept
//! anonymous viewers, mutations reject them with 401.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use uuid::Uuid;

use auth::middleware::{Viewer, optional_auth};
use common::models::LikeTarget;

use crate::{
    AppState,
    comments::CommentsForVideo,
    error::{ApiError, ApiResult},
    models::{CommentRequest, PageQuery, PublishVideoRequest, UpdateVideoRequest},
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let viewer_routes = Router::new()
        .route("/videos", post(publish_video))
        .route(
            "/videos/:video_id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/videos/:video_id/publish", patch(toggle_publish))
        .route("/videos/:video_id/views", post(record_view))
        .route("/videos/:video_id/likes", post(toggle_video_like))
        .route(
            "/videos/:video_id/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/comments/:comment_id",
            patch(update_comment).delete(delete_comment),
        )
        .route("/comments/:comment_id/likes", post(toggle_comment_like))
        .route("/channels/:handle", get(channel_profile))
        .route("/users/:user_id/videos", get(channel_videos))
        .route("/users/:user_id/subscribers", get(channel_subscribers))
        .route("/users/:user_id/subscriptions", post(toggle_subscription))
        .route("/history", get(watch_history))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            optional_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(viewer_routes)
        .with_state(state)
}

fn signed_in(viewer: &Viewer) -> ApiResult<Uuid> {
    viewer.id().ok_or(ApiError::Unauthorized)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    let video = state.videos.publish(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn get_video(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.videos.get(video_id, viewer.id()).await?))
}

pub async fn update_video(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(state.videos.update(user_id, video_id, payload).await?))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    state.videos.delete(user_id, video_id).await?;
    Ok(Json(json!({"message": "Video deleted successfully"})))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(state.videos.toggle_publish(user_id, video_id).await?))
}

pub async fn record_view(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(state.videos.record_view(user_id, video_id).await?))
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(
        state
            .likes
            .toggle(user_id, LikeTarget::Video(video_id))
            .await?,
    ))
}

/// Comments of a video, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .comments
        .comments_for_video(CommentsForVideo {
            video_id,
            viewer: viewer.id(),
            page: query.page(),
            page_size: query.page_size(),
        })
        .await?;
    Ok(Json(page))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    let comment = state
        .comments
        .add(user_id, video_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(
        state
            .comments
            .update(user_id, comment_id, &payload.content)
            .await?,
    ))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    state.comments.delete(user_id, comment_id).await?;
    Ok(Json(json!({"message": "Comment deleted successfully"})))
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    Ok(Json(
        state
            .likes
            .toggle(user_id, LikeTarget::Comment(comment_id))
            .await?,
    ))
}

pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.channels.channel_profile(&handle, viewer.id()).await?,
    ))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .videos
        .videos_for_channel(user_id, viewer.id(), query.page(), query.page_size())
        .await?;
    Ok(Json(page))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .channels
        .channel_subscribers(user_id, query.page(), query.page_size())
        .await?;
    Ok(Json(page))
}

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber_id = signed_in(&viewer)?;
    Ok(Json(
        state
            .channels
            .toggle_subscription(subscriber_id, user_id)
            .await?,
    ))
}

/// The signed-in viewer's watch history, most recent first
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = signed_in(&viewer)?;
    let page = state
        .videos
        .watch_history(user_id, query.page(), query.page_size())
        .await?;
    Ok(Json(page))
}
