// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP sync API: pull changes, push pending updates, query status.
//!
//! ```text
//! GET  /sync/:entityType?lastSyncTimestamp=<ms>  → { success, data, syncTimestamp }
//! POST /sync/:entityType  { updates }            → { success, results, syncTimestamp }
//! GET  /sync/status                              → JSON
//! ```
//!
//! Every request carries `Authorization: Bearer <token>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use eco_core::{PendingUpdate, PullResponse, PushRequest, PushResponse};
use reqwest::{Response, Url};
use serde_json::Value;
use tracing::{debug, warn};

/// Error type for sync API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no authentication token (set ECOSYNC_TOKEN or `token` in the config file)")]
    MissingToken,

    #[error("invalid sync url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The server answered with `success: false`.
    #[error("server rejected request: {0}")]
    Rejected(String),
}

/// Result type for sync API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future returned by [`SyncApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// The backend's sync endpoints.
///
/// Abstracted so the sync service can be tested without a server.
pub trait SyncApi: Send + Sync {
    /// Fetches changes to `entity_type` since the `since` watermark.
    fn pull<'a>(&'a self, entity_type: &'a str, since: i64) -> ApiFuture<'a, PullResponse>;

    /// Sends a batch of pending updates.
    fn push<'a>(
        &'a self,
        entity_type: &'a str,
        updates: &'a [PendingUpdate],
    ) -> ApiFuture<'a, PushResponse>;

    /// Returns the server's sync status document.
    fn status(&self) -> ApiFuture<'_, Value>;
}

impl<A: SyncApi + ?Sized> SyncApi for Arc<A> {
    fn pull<'a>(&'a self, entity_type: &'a str, since: i64) -> ApiFuture<'a, PullResponse> {
        (**self).pull(entity_type, since)
    }

    fn push<'a>(
        &'a self,
        entity_type: &'a str,
        updates: &'a [PendingUpdate],
    ) -> ApiFuture<'a, PushResponse> {
        (**self).push(entity_type, updates)
    }

    fn status(&self) -> ApiFuture<'_, Value> {
        (**self).status()
    }
}

/// [`SyncApi`] over HTTP using reqwest.
#[derive(Clone)]
pub struct HttpSyncApi {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl HttpSyncApi {
    /// `base_url` is the backend root; `/sync/...` is appended to it.
    pub fn new(base_url: &str, token: Option<String>, http: reqwest::Client) -> ApiResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{} cannot be a base", base_url)));
        }
        Ok(HttpSyncApi {
            base_url,
            http,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Builds `<base>/sync/<segment>`.
    pub fn sync_url(&self, segment: &str) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("sync")
            .push(segment);
        Ok(url)
    }

    fn token(&self) -> ApiResult<&str> {
        self.token.as_deref().ok_or(ApiError::MissingToken)
    }
}

/// Turns a non-2xx response into [`ApiError::Server`], preferring the
/// body's `message` field.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(text);

    warn!(status = status.as_u16(), message = %message, "sync request failed");
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

fn rejected(message: Option<String>) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| "request was not successful".to_string()))
}

impl SyncApi for HttpSyncApi {
    fn pull<'a>(&'a self, entity_type: &'a str, since: i64) -> ApiFuture<'a, PullResponse> {
        Box::pin(async move {
            let mut url = self.sync_url(entity_type)?;
            url.query_pairs_mut()
                .append_pair("lastSyncTimestamp", &since.to_string());
            debug!(entity = entity_type, since, "pulling changes");

            let response = self
                .http
                .get(url)
                .bearer_auth(self.token()?)
                .send()
                .await?;
            let body: PullResponse = check_status(response).await?.json().await?;
            if !body.success {
                return Err(rejected(body.message));
            }

            debug!(
                entity = entity_type,
                records = body.data.len(),
                timestamp = ?body.sync_timestamp,
                "pull complete"
            );
            Ok(body)
        })
    }

    fn push<'a>(
        &'a self,
        entity_type: &'a str,
        updates: &'a [PendingUpdate],
    ) -> ApiFuture<'a, PushResponse> {
        Box::pin(async move {
            let url = self.sync_url(entity_type)?;
            let request = PushRequest {
                updates: updates.to_vec(),
            };
            debug!(entity = entity_type, updates = updates.len(), "pushing updates");

            let response = self
                .http
                .post(url)
                .bearer_auth(self.token()?)
                .json(&request)
                .send()
                .await?;
            let body: PushResponse = check_status(response).await?.json().await?;
            if !body.success {
                return Err(rejected(body.message));
            }

            debug!(
                entity = entity_type,
                results = body.results.len(),
                timestamp = ?body.sync_timestamp,
                "push complete"
            );
            Ok(body)
        })
    }

    fn status(&self) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            let url = self.sync_url("status")?;
            let response = self
                .http
                .get(url)
                .bearer_auth(self.token()?)
                .send()
                .await?;
            Ok(check_status(response).await?.json().await?)
        })
    }
}
