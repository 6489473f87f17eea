// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token middleware tests.
//!
//! These tests verify that protected routes require a valid access token,
//! accepted from either the `accessToken` cookie or a Bearer header.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use vidtube_accounts::config::Config;
use vidtube_accounts::models::{NewUser, User};
use vidtube_accounts::services::password::PasswordHash;
use vidtube_accounts::services::TokenService;

mod common;
use common::{authed_request, body_json, create_test_app, login, register, send};

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .uri("/api/v1/users/current-user")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unauthorized request");
    assert_eq!(body["statusCode"], 401);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = create_test_app();

    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/current-user", "invalid.jwt.token", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid Access Token");
}

#[tokio::test]
async fn test_protected_route_with_cookie() {
    let (app, _, _) = create_test_app();
    register(&app, "alice", "alice@x.com", "pw1").await;
    let session = login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        Request::builder()
            .uri("/api/v1/users/current-user")
            .header(header::COOKIE, format!("accessToken={}", session.access_token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_for_unknown_user_rejected() {
    let (app, _, _) = create_test_app();

    // Correctly signed, but the subject was never stored.
    let ghost = User::from_new(NewUser {
        username: "ghost".to_string(),
        email: "ghost@x.com".to_string(),
        fullname: "Ghost".to_string(),
        password_hash: PasswordHash::new("pw", 4).unwrap(),
        avatar: None,
        cover_image: None,
    });
    let token = TokenService::new(&Config::test_default())
        .issue_access_token(&ghost)
        .unwrap();

    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/current-user", &token, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid Access Token");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let (app, _, _) = create_test_app();
    register(&app, "alice", "alice@x.com", "pw1").await;
    let session = login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        authed_request(
            "GET",
            "/api/v1/users/current-user",
            &session.refresh_token,
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/users/login")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_health_no_auth_required() {
    let (app, _, _) = create_test_app();

    let response = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(body_json(response).await["status"], "ok");
}
