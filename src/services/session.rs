// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session flows: registration, login, refresh, logout and account updates.
//!
//! Session lifecycle per user:
//! Anonymous -> Authenticated (login) -> refresh* -> LoggedOut (logout).
//!
//! The refresh flow is read -> compare -> write on the user's stored
//! refresh-token digest with no lock. Two concurrent refreshes carrying the
//! same valid token both succeed and the last write wins; the losing
//! response's refresh token then fails with "expired or used" on its next
//! use.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::ValidateEmail;

use crate::config::Config;
use crate::db::{CredentialStore, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::normalize_handle;
use crate::models::{NewUser, User, UserUpdate, UserView};
use crate::services::password::PasswordHash;
use crate::services::tokens::{refresh_token_matches, TokenPair, TokenService, INVALID_REFRESH_TOKEN};

pub const REFRESH_TOKEN_REUSED: &str = "Refresh token is expired or used";
pub const USERNAME_HAS_AT: &str = "Username must not contain '@'";
const ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// How a login request names the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginIdentifier<'a> {
    /// Matched against usernames, then emails.
    UsernameOrEmail(&'a str),
    /// Matched against emails only.
    Email(&'a str),
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Orchestrates the credential store and the token service.
#[derive(Clone)]
pub struct SessionService {
    db: Arc<dyn Store>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl SessionService {
    pub fn new(config: &Config, db: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self {
            db,
            tokens,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Create an account. The username and email are stored lowercase.
    pub async fn register(&self, input: Registration) -> Result<UserView, AppError> {
        let fullname = input.fullname.trim();
        let username = normalize_handle(&input.username);
        let email = normalize_handle(&input.email);

        if fullname.is_empty()
            || username.is_empty()
            || email.is_empty()
            || input.password.trim().is_empty()
        {
            return Err(AppError::BadRequest(ALL_FIELDS_REQUIRED.to_string()));
        }
        // A username shaped like an email would shadow that email at login.
        if username.contains('@') {
            return Err(AppError::BadRequest(USERNAME_HAS_AT.to_string()));
        }
        if !email.validate_email() {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }

        let password_hash = self.hash_password(input.password).await?;

        let user = self
            .db
            .create(NewUser {
                username,
                email,
                fullname: fullname.to_string(),
                password_hash,
                avatar: non_blank(input.avatar),
                cover_image: non_blank(input.cover_image),
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user.into())
    }

    /// Authenticate (case-insensitive) and start a session.
    pub async fn login(
        &self,
        identifier: LoginIdentifier<'_>,
        password: &str,
    ) -> Result<Session, AppError> {
        let (value, email_only) = match identifier {
            LoginIdentifier::UsernameOrEmail(value) => (normalize_handle(value), false),
            LoginIdentifier::Email(value) => (normalize_handle(value), true),
        };
        if value.is_empty() {
            return Err(AppError::BadRequest(
                "username or email is required".to_string(),
            ));
        }

        let found = if email_only {
            self.db.find_by_email(&value).await?
        } else {
            self.db.find_by_username_or_email(&value).await?
        };
        let user = found.ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !self.verify_password(&user, password).await? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized(
                "Invalid user credentials".to_string(),
            ));
        }

        let tokens = self.tokens.rotate(self.db.as_ref(), &user).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// End the caller's session. Safe to call repeatedly.
    pub async fn logout(&self, auth: &AuthUser) -> Result<(), AppError> {
        self.db
            .update_fields(&auth.user_id, UserUpdate::clear_refresh_token())
            .await?;
        tracing::info!(user_id = %auth.user_id, "User logged out");
        Ok(())
    }

    /// Exchange the current refresh token for a new pair.
    ///
    /// A token that verifies but is not the stored one has already been
    /// rotated or revoked, which is reported as reuse.
    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        let token = incoming
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

        let claims = self.tokens.verify_refresh_token(token)?;

        let user = self
            .db
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))?;

        if !refresh_token_matches(token, user.refresh_token_hash.as_deref()) {
            tracing::warn!(
                user_id = %user.id,
                "Stale refresh token presented (reused or revoked)"
            );
            return Err(AppError::Unauthorized(REFRESH_TOKEN_REUSED.to_string()));
        }

        let tokens = self.tokens.rotate(self.db.as_ref(), &user).await?;
        tracing::info!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    pub async fn change_password(
        &self,
        auth: &AuthUser,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if new_password.trim().is_empty() {
            return Err(AppError::BadRequest("New password is required".to_string()));
        }

        let user = self.load_user(auth).await?;
        if !self.verify_password(&user, old_password).await? {
            return Err(AppError::BadRequest("Invalid old password".to_string()));
        }

        let password_hash = self.hash_password(new_password.to_string()).await?;
        self.db
            .update_fields(&user.id, UserUpdate::password(password_hash))
            .await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    pub async fn current_user(&self, auth: &AuthUser) -> Result<UserView, AppError> {
        Ok(self.load_user(auth).await?.into())
    }

    /// Update display name and email. Both are required.
    pub async fn update_account_details(
        &self,
        auth: &AuthUser,
        fullname: &str,
        email: &str,
    ) -> Result<UserView, AppError> {
        let fullname = fullname.trim();
        let email = normalize_handle(email);

        if fullname.is_empty() || email.is_empty() {
            return Err(AppError::BadRequest(ALL_FIELDS_REQUIRED.to_string()));
        }
        if !email.validate_email() {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }

        let user = self
            .db
            .update_fields(
                &auth.user_id,
                UserUpdate {
                    fullname: Some(fullname.to_string()),
                    email: Some(email),
                    ..Default::default()
                },
            )
            .await?;
        Ok(user.into())
    }

    /// Point the avatar at an already-uploaded image.
    pub async fn update_avatar(&self, auth: &AuthUser, url: &str) -> Result<UserView, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::BadRequest("Avatar file is missing".to_string()));
        }

        let update = UserUpdate {
            avatar: Some(url.to_string()),
            ..Default::default()
        };
        Ok(self.db.update_fields(&auth.user_id, update).await?.into())
    }

    /// Point the cover image at an already-uploaded image.
    pub async fn update_cover_image(
        &self,
        auth: &AuthUser,
        url: &str,
    ) -> Result<UserView, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::BadRequest(
                "Cover image file is missing".to_string(),
            ));
        }

        let update = UserUpdate {
            cover_image: Some(url.to_string()),
            ..Default::default()
        };
        Ok(self.db.update_fields(&auth.user_id, update).await?.into())
    }

    async fn load_user(&self, auth: &AuthUser) -> Result<User, AppError> {
        self.db
            .find_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<PasswordHash, AppError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || PasswordHash::new(&password, cost))
            .await
            .context("password hashing task failed")??;
        Ok(hash)
    }

    async fn verify_password(&self, user: &User, password: &str) -> Result<bool, AppError> {
        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || hash.verify(&password))
            .await
            .context("password verification task failed")??;
        Ok(matches)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
