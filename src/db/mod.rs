// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`CredentialStore`] owns user records; [`RelationshipStore`] reads the
//! subscription and video collections maintained elsewhere. Both are
//! implemented by [`FirestoreDb`] and [`MemoryDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewUser, User, UserUpdate, Video};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const VIDEOS: &str = "videos";
}

pub const DUPLICATE_USER: &str = "User with username or email already exists";
pub const DUPLICATE_EMAIL: &str = "Email is already in use";

/// Persistent user records.
///
/// Usernames and emails passed in must already be normalized
/// (see [`crate::models::user::normalize_handle`]).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Match `identifier` against either the username or the email.
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Fetch several users. Unknown IDs are skipped; order is unspecified.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError>;

    /// Insert a new user. Fails with [`AppError::Conflict`] if the username or
    /// email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with [`AppError::NotFound`] for an unknown ID and with
    /// [`AppError::Conflict`] if a changed email belongs to another user.
    async fn update_fields(&self, id: &str, update: UserUpdate) -> Result<User, AppError>;
}

/// Read access to subscription edges and videos.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Edges where `channel_id` is the channel.
    async fn count_subscribers(&self, channel_id: &str) -> Result<u64, AppError>;

    /// Edges where `subscriber_id` is the subscriber.
    async fn count_subscriptions(&self, subscriber_id: &str) -> Result<u64, AppError>;

    async fn is_subscribed(&self, subscriber_id: &str, channel_id: &str)
        -> Result<bool, AppError>;

    /// Fetch videos by ID. Unknown IDs are skipped; order is unspecified.
    async fn find_videos(&self, ids: &[String]) -> Result<Vec<Video>, AppError>;
}

/// Everything the services need from persistence.
pub trait Store: CredentialStore + RelationshipStore {}

impl<T: CredentialStore + RelationshipStore> Store for T {}
