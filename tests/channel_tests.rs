// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Channel profile and watch history tests.

use axum::http::StatusCode;

mod common;
use common::{
    authed_request, body_json, create_test_app, login, register, send, subscribe, test_video,
};

#[tokio::test]
async fn test_channel_profile_counts_and_subscription_flag() {
    let (app, _, db) = create_test_app();
    let creator = register(&app, "creator", "creator@x.com", "pw").await;
    let viewer = register(&app, "viewer", "viewer@x.com", "pw").await;
    let fan1 = register(&app, "fan1", "fan1@x.com", "pw").await;
    let fan2 = register(&app, "fan2", "fan2@x.com", "pw").await;
    let lurker = register(&app, "lurker", "lurker@x.com", "pw").await;

    subscribe(&db, &viewer, &creator);
    subscribe(&db, &fan1, &creator);
    subscribe(&db, &fan2, &creator);
    subscribe(&db, &creator, &fan1);

    let session = login(&app, "viewer", "pw").await;
    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/c/Creator", &session.access_token, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], creator.as_str());
    assert_eq!(body["data"]["subscribersCount"], 3);
    assert_eq!(body["data"]["channelsSubscribedToCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], true);
    assert!(body["data"].get("passwordHash").is_none());

    let other = login(&app, "lurker", "pw").await;
    assert_eq!(other.user_id, lurker);
    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/c/creator", &other.access_token, None),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["subscribersCount"], 3);
    assert_eq!(body["data"]["isSubscribed"], false);
}

#[tokio::test]
async fn test_channel_profile_unknown_channel() {
    let (app, _, _) = create_test_app();
    register(&app, "viewer", "viewer@x.com", "pw").await;
    let session = login(&app, "viewer", "pw").await;

    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/c/ghost", &session.access_token, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Channel does not exist");
}

#[tokio::test]
async fn test_channel_profile_requires_auth() {
    let (app, _, _) = create_test_app();
    register(&app, "creator", "creator@x.com", "pw").await;

    let response = send(
        &app,
        axum::http::Request::builder()
            .uri("/api/v1/users/c/creator")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_watch_history_order_and_owner_projection() {
    let (app, _, db) = create_test_app();
    let creator = register(&app, "creator", "creator@x.com", "pw").await;
    let viewer = register(&app, "viewer", "viewer@x.com", "pw").await;

    db.upsert_video(test_video("v1", &creator));
    db.upsert_video(test_video("v2", &creator));
    db.push_watch_history(&viewer, "v1").unwrap();
    db.push_watch_history(&viewer, "v2").unwrap();

    let session = login(&app, "viewer", "pw").await;
    let response = send(
        &app,
        authed_request("GET", "/api/v1/users/history", &session.access_token, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "v1");
    assert_eq!(entries[1]["id"], "v2");

    let owner = entries[0]["owner"].as_object().unwrap();
    assert_eq!(owner.len(), 3);
    assert_eq!(owner["username"], "creator");
    assert_eq!(owner["fullname"], "creator Tester");
    assert!(owner["avatar"].is_null());
}

#[tokio::test]
async fn test_watch_history_duplicates_and_missing_videos() {
    let (app, _, db) = create_test_app();
    let creator = register(&app, "creator", "creator@x.com", "pw").await;
    let viewer = register(&app, "viewer", "viewer@x.com", "pw").await;

    db.upsert_video(test_video("v1", &creator));
    db.upsert_video(test_video("orphan", "deleted-user"));
    for id in ["v1", "gone", "orphan", "v1"] {
        db.push_watch_history(&viewer, id).unwrap();
    }

    let session = login(&app, "viewer", "pw").await;
    let body = body_json(
        send(
            &app,
            authed_request("GET", "/api/v1/users/history", &session.access_token, None),
        )
        .await,
    )
    .await;

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["v1", "orphan", "v1"]);
    assert!(body["data"][1]["owner"].is_null());
}

#[tokio::test]
async fn test_watch_history_empty() {
    let (app, _, _) = create_test_app();
    register(&app, "viewer", "viewer@x.com", "pw").await;
    let session = login(&app, "viewer", "pw").await;

    let body = body_json(
        send(
            &app,
            authed_request("GET", "/api/v1/users/history", &session.access_token, None),
        )
        .await,
    )
    .await;
    assert_eq!(body["data"], serde_json::json!([]));
}
