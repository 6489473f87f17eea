// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Channel profiles and watch history.
//!
//! Both views join user records with the subscription and video
//! collections. Missing videos are dropped from the history; a video whose
//! owner no longer exists is kept with `owner: None`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::{CredentialStore, RelationshipStore, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::normalize_handle;
use crate::models::{ChannelProfile, User, Video, VideoOwner, WatchHistoryEntry};

pub const CHANNEL_NOT_FOUND: &str = "Channel does not exist";

#[derive(Clone)]
pub struct ChannelService {
    db: Arc<dyn Store>,
}

impl ChannelService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Public profile of `username` as seen by `viewer`.
    pub async fn channel_profile(
        &self,
        viewer: &AuthUser,
        username: &str,
    ) -> Result<ChannelProfile, AppError> {
        let username = normalize_handle(username);
        if username.is_empty() {
            return Err(AppError::BadRequest("username is missing".to_string()));
        }

        let channel = self
            .db
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound(CHANNEL_NOT_FOUND.to_string()))?;

        let (subscribers_count, channels_subscribed_to_count, is_subscribed) = tokio::try_join!(
            self.db.count_subscribers(&channel.id),
            self.db.count_subscriptions(&channel.id),
            self.db.is_subscribed(&viewer.user_id, &channel.id),
        )?;

        tracing::debug!(
            channel_id = %channel.id,
            subscribers_count,
            "Channel profile assembled"
        );

        Ok(ChannelProfile {
            id: channel.id,
            fullname: channel.fullname,
            username: channel.username,
            email: channel.email,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
            created_at: channel.created_at,
        })
    }

    /// The viewer's watch history in stored order, duplicates included.
    pub async fn watch_history(
        &self,
        viewer: &AuthUser,
    ) -> Result<Vec<WatchHistoryEntry>, AppError> {
        let user = self
            .db
            .find_by_id(&viewer.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if user.watch_history.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids = distinct(user.watch_history.iter());
        let videos: HashMap<String, Video> = self
            .db
            .find_videos(&video_ids)
            .await?
            .into_iter()
            .map(|video| (video.id.clone(), video))
            .collect();

        let owner_ids = distinct(videos.values().map(|video| &video.owner_id));
        let owners: HashMap<String, VideoOwner> = self
            .db
            .find_by_ids(&owner_ids)
            .await?
            .iter()
            .map(|owner: &User| (owner.id.clone(), VideoOwner::from(owner)))
            .collect();

        let skipped = user
            .watch_history
            .iter()
            .filter(|id| !videos.contains_key(*id))
            .count();
        if skipped > 0 {
            tracing::debug!(user_id = %user.id, skipped, "Watch history references missing videos");
        }

        Ok(user
            .watch_history
            .iter()
            .filter_map(|id| videos.get(id))
            .map(|video| {
                let owner = owners.get(&video.owner_id).cloned();
                WatchHistoryEntry::new(video.clone(), owner)
            })
            .collect())
    }
}

/// First occurrence of each ID, in order.
fn distinct<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if seen.insert(id.as_str()) {
            out.push(id.clone());
        }
    }
    out
}
