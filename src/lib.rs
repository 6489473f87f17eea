// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! VidTube accounts: the user-account backend of a video-sharing service.
//!
//! This crate provides registration, cookie/JWT sessions with rotating
//! refresh tokens, account updates, channel profiles and watch history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{ChannelService, SessionService, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub tokens: TokenService,
    pub sessions: SessionService,
    pub channels: ChannelService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(&config);
        let sessions = SessionService::new(&config, db.clone(), tokens.clone());
        let channels = ChannelService::new(db.clone());

        Self {
            config,
            db,
            tokens,
            sessions,
            channels,
        }
    }
}
