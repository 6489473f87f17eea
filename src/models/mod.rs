// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod channel;
pub mod user;
pub mod video;

pub use channel::{ChannelProfile, VideoOwner, WatchHistoryEntry};
pub use user::{NewUser, User, UserUpdate, UserView};
pub use video::{Subscription, Video};
