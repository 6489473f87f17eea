// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Channel profile and watch history routes (authenticated).

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ChannelProfile, WatchHistoryEntry};
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/c/{username}", get(channel_profile))
        .route("/history", get(watch_history))
}

async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>> {
    let profile = state.channels.channel_profile(&viewer, &username).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<WatchHistoryEntry>>> {
    let history = state.channels.watch_history(&viewer).await?;
    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}
