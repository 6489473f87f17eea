// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by `DashMap`.
//!
//! Used by tests and for local development (`STORE_BACKEND=memory`).
//! Username and email uniqueness is enforced through per-handle index maps,
//! reserved with the `Entry` API so two concurrent registrations cannot both
//! claim the same handle.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{CredentialStore, RelationshipStore, DUPLICATE_EMAIL, DUPLICATE_USER};
use crate::error::AppError;
use crate::models::video::edge_id;
use crate::models::{NewUser, Subscription, User, UserUpdate, Video};

#[derive(Default)]
struct Collections {
    users: DashMap<String, User>,
    /// username -> user ID
    usernames: DashMap<String, String>,
    /// email -> user ID
    emails: DashMap<String, String>,
    /// edge ID -> subscription
    subscriptions: DashMap<String, Subscription>,
    videos: DashMap<String, Video>,
}

/// In-memory database. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Collections>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a video record (written by the video service in production).
    pub fn upsert_video(&self, video: Video) {
        self.inner.videos.insert(video.id.clone(), video);
    }

    /// Store a subscription edge. Re-subscribing is a no-op.
    pub fn upsert_subscription(&self, subscription: Subscription) {
        self.inner
            .subscriptions
            .entry(subscription.document_id())
            .or_insert(subscription);
    }

    /// Append a video to a user's watch history.
    pub fn push_watch_history(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        let mut user = self
            .inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.watch_history.push(video_id.to_string());
        Ok(())
    }

    fn lookup(&self, index: &DashMap<String, String>, key: &str) -> Option<User> {
        let id = index.get(key).map(|entry| entry.value().clone())?;
        self.inner.users.get(&id).map(|user| user.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryDb {
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lookup(&self.inner.usernames, identifier)
            .or_else(|| self.lookup(&self.inner.emails, identifier)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.lookup(&self.inner.usernames, username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lookup(&self.inner.emails, email))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(id).map(|user| user.clone()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.inner.users.get(id).map(|user| user.clone()))
            .collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = User::from_new(new_user);

        match self.inner.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(AppError::Conflict(DUPLICATE_USER.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        match self.inner.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                self.inner.usernames.remove(&user.username);
                return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        self.inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_fields(&self, id: &str, update: UserUpdate) -> Result<User, AppError> {
        // Holding the user entry serializes updates to the same user, so the
        // email read here is still current when the old reservation is freed.
        let mut user = self
            .inner
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let old_email = user.email.clone();
        let new_email = update
            .email
            .clone()
            .filter(|email| *email != old_email);

        if let Some(email) = &new_email {
            match self.inner.emails.entry(email.clone()) {
                Entry::Occupied(_) => return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string())),
                Entry::Vacant(slot) => {
                    slot.insert(id.to_string());
                }
            }
        }

        update.apply(&mut user);
        let updated = user.clone();

        if new_email.is_some() {
            self.inner
                .emails
                .remove_if(&old_email, |_, owner| owner == id);
        }

        Ok(updated)
    }
}

#[async_trait]
impl RelationshipStore for MemoryDb {
    async fn count_subscribers(&self, channel_id: &str) -> Result<u64, AppError> {
        Ok(self
            .inner
            .subscriptions
            .iter()
            .filter(|edge| edge.channel_id == channel_id)
            .count() as u64)
    }

    async fn count_subscriptions(&self, subscriber_id: &str) -> Result<u64, AppError> {
        Ok(self
            .inner
            .subscriptions
            .iter()
            .filter(|edge| edge.subscriber_id == subscriber_id)
            .count() as u64)
    }

    async fn is_subscribed(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .inner
            .subscriptions
            .contains_key(&edge_id(subscriber_id, channel_id)))
    }

    async fn find_videos(&self, ids: &[String]) -> Result<Vec<Video>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.inner.videos.get(id).map(|video| video.clone()))
            .collect())
    }
}
