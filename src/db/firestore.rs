// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Collections:
//! - `users` (account records, keyed by user ID)
//! - `user_handles` (one document per claimed username / email)
//! - `subscriptions` (edges, keyed by `{subscriber}_{channel}`)
//! - `videos` (keyed by video ID)
//!
//! Firestore has no unique indexes, so uniqueness of usernames and emails is
//! enforced by creating a `user_handles` document per handle. Creation fails
//! if the document already exists, which makes the claim atomic.

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::{collections, CredentialStore, RelationshipStore, DUPLICATE_EMAIL, DUPLICATE_USER};
use crate::error::AppError;
use crate::models::video::edge_id;
use crate::models::{NewUser, Subscription, User, UserUpdate, Video};

const MAX_CONCURRENT_DB_OPS: usize = 50;
const USER_HANDLES: &str = "user_handles";

/// Claim document for a username or email.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HandleClaim {
    user_id: String,
}

/// Row returned by a count aggregation.
#[derive(Debug, Deserialize)]
struct EdgeCount {
    count: u64,
}

#[derive(Debug, Clone, Copy)]
enum Handle {
    Username,
    Email,
}

impl Handle {
    fn document_id(self, value: &str) -> String {
        let prefix = match self {
            Handle::Username => "username",
            Handle::Email => "email",
        };
        format!("{}:{}", prefix, urlencoding::encode(value))
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Handle Claims ───────────────────────────────────────────

    /// Claim a handle for `user_id`. Returns `false` if someone else holds it.
    async fn claim_handle(
        &self,
        handle: Handle,
        value: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let claim = HandleClaim {
            user_id: user_id.to_string(),
        };

        let result: Result<HandleClaim, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(USER_HANDLES)
            .document_id(handle.document_id(value))
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn release_handle(&self, handle: Handle, value: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(USER_HANDLES)
            .document_id(handle.document_id(value))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Best-effort release of `claims`; failures are logged, not returned.
    async fn release_quietly(&self, claims: &[(Handle, &str)]) {
        for (handle, value) in claims {
            if let Err(e) = self.release_handle(*handle, value).await {
                tracing::warn!(
                    error = %e,
                    handle = %handle.document_id(value),
                    "Failed to release handle claim"
                );
            }
        }
    }

    /// Release `claims` if `result` is an error, then hand `result` back.
    async fn release_on_error<T>(
        &self,
        result: Result<T, AppError>,
        claims: &[(Handle, &str)],
    ) -> Result<T, AppError> {
        if result.is_err() {
            self.release_quietly(claims).await;
        }
        result
    }

    async fn find_by_handle(&self, handle: Handle, value: &str) -> Result<Option<User>, AppError> {
        let claim: Option<HandleClaim> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(USER_HANDLES)
            .obj()
            .one(&handle.document_id(value))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match claim {
            Some(claim) => self.find_by_id(&claim.user_id).await,
            None => Ok(None),
        }
    }

    /// Count subscription edges where `field == value`, server side.
    async fn count_edges(&self, field: &str, value: &str) -> Result<u64, AppError> {
        let rows: Vec<EdgeCount> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.first().map_or(0, |row| row.count))
    }

    // ─── User Documents ──────────────────────────────────────────

    async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        self.get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write only `fields` of `user`, so concurrent writers of other fields
    /// (e.g. watch history) are not clobbered.
    async fn write_user_fields(
        &self,
        user: &User,
        fields: Vec<&'static str>,
    ) -> Result<User, AppError> {
        self.get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Records Owned By Other Services ─────────────────────────

    /// Store a video record.
    pub async fn upsert_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(&video.id)
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store a subscription edge.
    pub async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(subscription.document_id())
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a video to a user's watch history.
    pub async fn push_watch_history(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        let mut user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.watch_history.push(video_id.to_string());

        self.write_user_fields(&user, vec!["watch_history"]).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FirestoreDb {
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, AppError> {
        if let Some(user) = self.find_by_handle(Handle::Username, identifier).await? {
            return Ok(Some(user));
        }
        self.find_by_handle(Handle::Email, identifier).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_by_handle(Handle::Username, username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_by_handle(Handle::Email, email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        let client = self.get_client()?;

        let users = stream::iter(ids.to_vec())
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj::<User>()
                    .one(&id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users.into_iter().flatten().collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = User::from_new(new_user);

        if !self
            .claim_handle(Handle::Username, &user.username, &user.id)
            .await?
        {
            return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
        }

        let username_claim = [(Handle::Username, user.username.as_str())];
        let email_claimed = self
            .claim_handle(Handle::Email, &user.email, &user.id)
            .await;
        if !self.release_on_error(email_claimed, &username_claim).await? {
            self.release_quietly(&username_claim).await;
            return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
        }

        let inserted = self.insert_user(&user).await;
        let claims = [
            (Handle::Username, user.username.as_str()),
            (Handle::Email, user.email.as_str()),
        ];
        let stored = self.release_on_error(inserted, &claims).await?;

        tracing::debug!(user_id = %stored.id, "User document created");
        Ok(stored)
    }

    async fn update_fields(&self, id: &str, update: UserUpdate) -> Result<User, AppError> {
        let mut user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let old_email = user.email.clone();
        let new_email = update
            .email
            .clone()
            .filter(|email| *email != old_email);

        if let Some(email) = &new_email {
            if !self.claim_handle(Handle::Email, email, id).await? {
                return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
            }
        }

        let fields = update.apply(&mut user);
        if fields.is_empty() {
            return Ok(user);
        }

        let written = self.write_user_fields(&user, fields).await;
        let new_claim: Vec<(Handle, &str)> = new_email
            .iter()
            .map(|email| (Handle::Email, email.as_str()))
            .collect();
        let stored = self.release_on_error(written, &new_claim).await?;

        if new_email.is_some() {
            self.release_quietly(&[(Handle::Email, old_email.as_str())])
                .await;
        }

        Ok(stored)
    }
}

#[async_trait]
impl RelationshipStore for FirestoreDb {
    async fn count_subscribers(&self, channel_id: &str) -> Result<u64, AppError> {
        self.count_edges("channel_id", channel_id).await
    }

    async fn count_subscriptions(&self, subscriber_id: &str) -> Result<u64, AppError> {
        self.count_edges("subscriber_id", subscriber_id).await
    }

    async fn is_subscribed(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let edge: Option<Subscription> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(&edge_id(subscriber_id, channel_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(edge.is_some())
    }

    async fn find_videos(&self, ids: &[String]) -> Result<Vec<Video>, AppError> {
        let client = self.get_client()?;

        let videos = stream::iter(ids.to_vec())
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::VIDEOS)
                    .obj::<Video>()
                    .one(&id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Video>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Video>>, AppError>>()?;

        Ok(videos.into_iter().flatten().collect())
    }
}
