// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access and refresh token issuance, verification and rotation.
//!
//! Both token kinds are HS256 JWTs signed with separate keys. Access tokens
//! are verified statelessly. A refresh token is only valid while the SHA-256
//! digest of it is the one stored on the user record; rotation overwrites
//! that digest, which revokes the previous refresh token.

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::{User, UserUpdate};

pub const INVALID_ACCESS_TOKEN: &str = "Invalid Access Token";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid Refresh Token";

/// Claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub fullname: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims embedded in refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Random token ID; makes every issued refresh token distinct
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(&config.access_token_secret),
            access_decoding: DecodingKey::from_secret(&config.access_token_secret),
            refresh_encoding: EncodingKey::from_secret(&config.refresh_token_secret),
            refresh_decoding: DecodingKey::from_secret(&config.refresh_token_secret),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Access token lifetime, used for cookie max-age.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Refresh token lifetime, used for cookie max-age.
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Sign a short-lived access token for `user`.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .context("access token signing failed")?;
        Ok(token)
    }

    /// Sign a long-lived refresh token for `user_id`.
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .context("refresh token signing failed")?;
        Ok(token)
    }

    /// Check signature and expiry of an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AppError::Unauthorized(INVALID_ACCESS_TOKEN.to_string())
            })
    }

    /// Check signature and expiry of a refresh token.
    ///
    /// This does not check revocation; see [`refresh_token_matches`].
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(
            token,
            &self.refresh_decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
        })
    }

    /// Issue a new token pair and make its refresh token the user's only
    /// valid one.
    ///
    /// Nothing is returned unless the new digest was persisted, so a failed
    /// write never hands out a token the store does not know about.
    pub async fn rotate<S>(&self, store: &S, user: &User) -> Result<TokenPair, AppError>
    where
        S: CredentialStore + ?Sized,
    {
        let access_token = self.issue_access_token(user)?;
        let refresh_token = self.issue_refresh_token(&user.id)?;

        store
            .update_fields(
                &user.id,
                UserUpdate::refresh_token(refresh_token_digest(&refresh_token)),
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// Digest stored in place of the refresh token itself.
pub fn refresh_token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Whether `token` is the refresh token whose digest is `stored`.
pub fn refresh_token_matches(token: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => {
            let digest = refresh_token_digest(token);
            digest.as_bytes().ct_eq(stored.as_bytes()).into()
        }
        None => false,
    }
}
