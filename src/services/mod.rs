// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod channels;
pub mod cookies;
pub mod password;
pub mod session;
pub mod tokens;

pub use channels::ChannelService;
pub use session::{LoginIdentifier, Registration, Session, SessionService};
pub use tokens::{TokenPair, TokenService};
