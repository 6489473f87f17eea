// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived, read-only views over users, subscriptions and videos.

use serde::{Deserialize, Serialize};

use super::{User, Video};

/// A user seen as the target of subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    /// Number of users subscribed to this channel
    pub subscribers_count: u64,
    /// Number of channels this user subscribes to
    pub channels_subscribed_to_count: u64,
    /// Whether the viewer is among the subscribers
    pub is_subscribed: bool,
    pub created_at: String,
}

/// Minimal projection of a video owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub fullname: String,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<&User> for VideoOwner {
    fn from(user: &User) -> Self {
        Self {
            fullname: user.fullname.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// One watch-history item: the full video plus its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration_secs: f64,
    pub views: u64,
    pub is_published: bool,
    pub created_at: String,
    /// `None` when the owner account no longer exists
    pub owner: Option<VideoOwner>,
}

impl WatchHistoryEntry {
    pub fn new(video: Video, owner: Option<VideoOwner>) -> Self {
        Self {
            id: video.id,
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            duration_secs: video.duration_secs,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            owner,
        }
    }
}
