// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vidtube_accounts::config::Config;
use vidtube_accounts::db::{FirestoreDb, MemoryDb};
use vidtube_accounts::models::{Subscription, Video};
use vidtube_accounts::routes::create_router;
use vidtube_accounts::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a Firestore connection to the emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app over a fresh in-memory store.
/// Returns the router, the shared state and a handle on the store for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, MemoryDb) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(config, Arc::new(db.clone())));
    (create_router(state.clone()), state, db)
}

/// Test app whose store always fails, for error-path tests.
#[allow(dead_code)]
pub fn create_offline_test_app() -> Router {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(FirestoreDb::new_mock()),
    ));
    create_router(state)
}

#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, access_token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Register a user over HTTP and return its ID.
#[allow(dead_code)]
pub async fn register(app: &Router, username: &str, email: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/users/register",
            json!({
                "fullname": format!("{username} Tester"),
                "username": username,
                "email": email,
                "password": password,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "registration failed");
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Tokens returned by a successful login.
#[allow(dead_code)]
pub struct LoggedIn {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[allow(dead_code)]
pub async fn login(app: &Router, identifier: &str, password: &str) -> LoggedIn {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/users/login",
            json!({ "username": identifier, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login failed");
    let body = body_json(response).await;
    LoggedIn {
        user_id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
        access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
        refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
    }
}

/// POST /refresh-token with the token in the JSON body.
#[allow(dead_code)]
pub async fn refresh(app: &Router, refresh_token: &str) -> Response {
    send(
        app,
        json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({ "refreshToken": refresh_token }),
        ),
    )
    .await
}

#[allow(dead_code)]
pub fn subscribe(db: &MemoryDb, subscriber_id: &str, channel_id: &str) {
    db.upsert_subscription(Subscription {
        subscriber_id: subscriber_id.to_string(),
        channel_id: channel_id.to_string(),
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
    });
}

#[allow(dead_code)]
pub fn test_video(id: &str, owner_id: &str) -> Video {
    Video {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        title: format!("Video {id}"),
        description: String::new(),
        video_file: format!("https://media.example.com/{id}.mp4"),
        thumbnail: format!("https://media.example.com/{id}.jpg"),
        duration_secs: 42.5,
        views: 0,
        is_published: true,
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
    }
}
