// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video and subscription records owned by other services.
//!
//! This crate only reads them.

use serde::{Deserialize, Serialize};

/// Video stored in the `videos` collection (document ID = `id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    /// User ID of the uploader
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Video file URL
    pub video_file: String,
    /// Thumbnail URL
    pub thumbnail: String,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub created_at: String,
}

fn default_published() -> bool {
    true
}

/// Subscription edge stored in the `subscriptions` collection.
///
/// Document ID is [`Subscription::document_id`], which keeps one edge per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// The subscribing user
    pub subscriber_id: String,
    /// The user being subscribed to
    pub channel_id: String,
    pub created_at: String,
}

impl Subscription {
    pub fn document_id(&self) -> String {
        edge_id(&self.subscriber_id, &self.channel_id)
    }
}

/// Document ID for the edge `subscriber -> channel`.
pub fn edge_id(subscriber_id: &str, channel_id: &str) -> String {
    format!("{}_{}", subscriber_id, channel_id)
}
