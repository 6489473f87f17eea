// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public session routes: register, login, refresh.

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::validated;
use crate::error::{AppError, Result};
use crate::models::UserView;
use crate::response::ApiResponse;
use crate::services::cookies::{access_cookie, refresh_cookie, REFRESH_COOKIE};
use crate::services::{LoginIdentifier, Registration, Session, TokenPair};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub fullname: String,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: String,
    /// bcrypt only looks at the first 72 bytes.
    #[serde(default)]
    #[validate(length(max = 72))]
    pub password: String,
    #[validate(url)]
    pub avatar: Option<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiResponse<UserView>> {
    let body = validated(body)?;
    let user = state
        .sessions
        .register(Registration {
            fullname: body.fullname,
            username: body.username,
            email: body.email,
            password: body.password,
            avatar: body.avatar,
            cover_image: body.cover_image,
        })
        .await?;

    Ok(ApiResponse::ok(user, "User registered successfully"))
}

/// Either `username` or `email` identifies the account. A non-blank
/// `email` is matched against emails only.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 72))]
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<Session>)> {
    let body = validated(body)?;
    let email = body.email.as_deref().filter(|e| !e.trim().is_empty());
    let identifier = match email {
        Some(email) => LoginIdentifier::Email(email),
        None => LoginIdentifier::UsernameOrEmail(body.username.as_deref().unwrap_or_default()),
    };

    let session = state.sessions.login(identifier, &body.password).await?;

    let jar = jar
        .add(access_cookie(
            &session.tokens.access_token,
            state.tokens.access_ttl_secs(),
        ))
        .add(refresh_cookie(
            &session.tokens.refresh_token,
            state.tokens.refresh_ttl_secs(),
        ));

    Ok((jar, ApiResponse::ok(session, "User logged in successfully")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// The refresh token comes from the cookie or, for non-browser clients, the
/// JSON body.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<TokenPair>)> {
    let from_body = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or(from_body.refresh_token);

    let tokens = state.sessions.refresh(incoming.as_deref()).await?;

    let jar = jar
        .add(access_cookie(
            &tokens.access_token,
            state.tokens.access_ttl_secs(),
        ))
        .add(refresh_cookie(
            &tokens.refresh_token,
            state.tokens.refresh_ttl_secs(),
        ));

    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}
