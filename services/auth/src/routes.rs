//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::AuthError,
    middleware::{AuthUser, require_auth},
    models::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
        UpdateAccountRequest, UpdateImageRequest,
    },
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_user).patch(update_account))
        .route("/auth/me/avatar", patch(update_avatar))
        .route("/auth/me/cover-image", patch(update_cover_image))
        .route("/auth/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let (user, tokens) = state.accounts.login(payload).await?;
    Ok(Json(LoginResponse { user, tokens }))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let tokens = state
        .accounts
        .sessions()
        .rotate_refresh_token(&payload.refresh_token)
        .await?;
    Ok(Json(tokens))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    state.accounts.sessions().revoke(user.id).await?;
    Ok(Json(json!({"message": "Logged out successfully"})))
}

/// Current user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(state.accounts.current_user(user.id).await?))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(state.accounts.update_details(user.id, payload).await?))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateImageRequest>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(state.accounts.update_avatar(user.id, &payload.url).await?))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateImageRequest>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(
        state
            .accounts
            .update_cover_image(user.id, &payload.url)
            .await?,
    ))
}

/// Password change endpoint
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state
        .accounts
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(json!({"message": "Password changed successfully"})))
}
