//! End-to-end tests for the authentication routes against the in-memory store

use std::sync::Arc;

use auth::{
    AppState,
    accounts::AccountService,
    jwt::{JwtConfig, TokenService},
    password::{CredentialStore, PasswordConfig},
    routes::create_router,
    session::SessionManager,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{SharedStore, store::MemoryStore};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let tokens = TokenService::new(JwtConfig {
        access_secret: "integration-access".to_string(),
        refresh_secret: "integration-refresh".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
    });
    let credentials = CredentialStore::new(&PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let sessions = SessionManager::new(store.clone(), tokens.clone());
    let accounts = AccountService::new(store, credentials, sessions);

    create_router(AppState { accounts, tokens })
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router) -> Value {
    let (status, user) = send(
        app,
        "POST",
        "/auth/register",
        None,
        json!({
            "handle": "Alice",
            "email": "alice@example.com",
            "display_name": "Alice",
            "password": "Wonder-Land-1",
            "avatar": "https://cdn.example.com/alice.png"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["handle"], "alice");
    assert_eq!(user["displayName"], "Alice");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("refreshTokenHash").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, login) = send(
        app,
        "POST",
        "/auth/login",
        None,
        json!({"handle_or_email": "alice", "password": "Wonder-Land-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login
}

#[tokio::test]
async fn test_refresh_rotation_and_logout_flow() {
    let app = app();
    let login = register_and_login(&app).await;
    let access = login["access_token"].as_str().unwrap().to_string();
    let refresh = login["refresh_token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, "GET", "/auth/me", Some(access.as_str()), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");

    let (status, rotated) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        json!({"refresh_token": refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    let new_access = rotated["access_token"].as_str().unwrap().to_string();

    // Replaying the rotated-out token fails with the uniform message
    let (status, body) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        json!({"refresh_token": refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    let (status, _) = send(&app, "POST", "/auth/logout", Some(new_access.as_str()), Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        json!({"refresh_token": new_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_access_token() {
    let app = app();
    let login = register_and_login(&app).await;
    let refresh = login["refresh_token"].as_str().unwrap();

    let (status, _) = send(&app, "GET", "/auth/me", None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/auth/me", Some("garbage"), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not accepted as an access token
    let (status, _) = send(&app, "GET", "/auth/me", Some(refresh), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = app();
    register_and_login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({
            "handle": "ALICE",
            "email": "someone@example.com",
            "display_name": "Impostor",
            "password": "Wonder-Land-1",
            "avatar": "https://cdn.example.com/x.png"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}
