// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

use crate::services::password::PasswordHash;
use crate::time_utils::now_rfc3339;

/// User account stored in the `users` collection (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID v4
    pub id: String,
    /// Lowercase, unique
    pub username: String,
    /// Lowercase, unique
    pub email: String,
    pub fullname: String,
    pub password_hash: PasswordHash,
    /// Avatar image URL
    #[serde(default)]
    pub avatar: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,
    /// SHA-256 digest of the only valid refresh token, if a session is active
    #[serde(default)]
    pub refresh_token_hash: Option<String>,
    /// Watched video IDs in viewing order (may repeat)
    #[serde(default)]
    pub watch_history: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Build a fresh user record from validated registration data.
    pub fn from_new(new_user: NewUser) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            fullname: new_user.fullname,
            password_hash: new_user.password_hash,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            refresh_token_hash: None,
            watch_history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Registration data handed to the credential store.
///
/// `username` and `email` must already be normalized with [`normalize_handle`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: PasswordHash,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// Partial update of a user record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: Option<PasswordHash>,
    /// `Some(None)` clears the stored refresh token.
    pub refresh_token_hash: Option<Option<String>>,
}

impl UserUpdate {
    /// Replace the active refresh token digest.
    pub fn refresh_token(digest: String) -> Self {
        Self {
            refresh_token_hash: Some(Some(digest)),
            ..Default::default()
        }
    }

    /// Drop the active refresh token.
    pub fn clear_refresh_token() -> Self {
        Self {
            refresh_token_hash: Some(None),
            ..Default::default()
        }
    }

    pub fn password(hash: PasswordHash) -> Self {
        Self {
            password_hash: Some(hash),
            ..Default::default()
        }
    }

    /// Apply the update in place and return the stored field names it touched
    /// (including `updated_at` when anything changed).
    pub fn apply(self, user: &mut User) -> Vec<&'static str> {
        let mut fields = Vec::new();

        if let Some(fullname) = self.fullname {
            user.fullname = fullname;
            fields.push("fullname");
        }
        if let Some(email) = self.email {
            user.email = email;
            fields.push("email");
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
            fields.push("avatar");
        }
        if let Some(cover_image) = self.cover_image {
            user.cover_image = Some(cover_image);
            fields.push("cover_image");
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
            fields.push("password_hash");
        }
        if let Some(refresh_token_hash) = self.refresh_token_hash {
            user.refresh_token_hash = refresh_token_hash;
            fields.push("refresh_token_hash");
        }

        if !fields.is_empty() {
            user.updated_at = now_rfc3339();
            fields.push("updated_at");
        }
        fields
    }
}

/// Canonical form of a username or email used for storage and lookup.
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// User as returned by the API (no password hash, no refresh token).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub watch_history: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: user.watch_history,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::from_new(NewUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            fullname: "Alice".to_string(),
            password_hash: PasswordHash::new("pw", 4).unwrap(),
            avatar: None,
            cover_image: None,
        })
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("  ALICE@X.com "), "alice@x.com");
        assert_eq!(normalize_handle("Bob"), "bob");
    }

    #[test]
    fn test_update_touches_only_given_fields() {
        let mut user = sample_user();
        let fields = UserUpdate::refresh_token("abc".to_string()).apply(&mut user);

        assert_eq!(fields, vec!["refresh_token_hash", "updated_at"]);
        assert_eq!(user.refresh_token_hash.as_deref(), Some("abc"));
        assert_eq!(user.fullname, "Alice");
    }

    #[test]
    fn test_clear_refresh_token() {
        let mut user = sample_user();
        user.refresh_token_hash = Some("abc".to_string());

        UserUpdate::clear_refresh_token().apply(&mut user);
        assert!(user.refresh_token_hash.is_none());
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut user = sample_user();
        let before = user.updated_at.clone();
        assert!(UserUpdate::default().apply(&mut user).is_empty());
        assert_eq!(user.updated_at, before);
    }

    #[test]
    fn test_view_excludes_secrets() {
        let mut user = sample_user();
        user.refresh_token_hash = Some("digest".to_string());

        let json = serde_json::to_value(UserView::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refreshTokenHash").is_none());
        assert_eq!(json["username"], "alice");
        assert!(json["watchHistory"].as_array().unwrap().is_empty());
    }
}
