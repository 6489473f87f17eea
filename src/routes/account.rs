// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the signed-in user's own account.
//! The auth middleware is applied in routes/mod.rs for these routes.

use axum::{
    extract::State,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::validated;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserView;
use crate::response::{ApiResponse, Empty};
use crate::services::cookies::cleared_cookies;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>)> {
    state.sessions.logout(&user).await?;

    let [access, refresh] = cleared_cookies();
    let jar = jar.add(access).add(refresh);

    Ok((jar, ApiResponse::ok(Empty::default(), "User logged out")))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(max = 72))]
    pub new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<Empty>> {
    let body = validated(body)?;
    state
        .sessions
        .change_password(&user, &body.old_password, &body.new_password)
        .await?;

    Ok(ApiResponse::ok(
        Empty::default(),
        "Password changed successfully",
    ))
}

async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<UserView>> {
    let view = state.sessions.current_user(&user).await?;
    Ok(ApiResponse::ok(view, "Current user fetched successfully"))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub fullname: String,
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: String,
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<ApiResponse<UserView>> {
    let body = validated(body)?;
    let view = state
        .sessions
        .update_account_details(&user, &body.fullname, &body.email)
        .await?;

    Ok(ApiResponse::ok(view, "Account details updated successfully"))
}

/// Reference to an image already uploaded to media storage.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    #[validate(url)]
    pub url: String,
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ImageRequest>,
) -> Result<ApiResponse<UserView>> {
    let body = validated(body)?;
    let view = state.sessions.update_avatar(&user, &body.url).await?;
    Ok(ApiResponse::ok(view, "Avatar image updated successfully"))
}

async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ImageRequest>,
) -> Result<ApiResponse<UserView>> {
    let body = validated(body)?;
    let view = state.sessions.update_cover_image(&user, &body.url).await?;
    Ok(ApiResponse::ok(view, "Cover image updated successfully"))
}
