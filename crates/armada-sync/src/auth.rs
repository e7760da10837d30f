//! Access-token acquisition for the Sheets API.
//!
//! The token is fetched lazily on first use and cached for the lifetime of
//! the handle. Concurrent first callers share a single fetch.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::SyncError;

/// Path of the default service account's token on the metadata server.
const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Where access tokens come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A pre-issued bearer token.
    Static(String),
    /// The compute metadata server at this base URL.
    Metadata {
        /// Base URL, e.g. `http://metadata.google.internal`.
        url: String,
    },
}

/// A lazily-initialized, single-flight access token.
#[derive(Debug)]
pub struct AuthHandle {
    source: TokenSource,
    http: reqwest::Client,
    token: OnceCell<String>,
    fetches: AtomicUsize,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl AuthHandle {
    /// Create a handle. Nothing is fetched until [`token`](Self::token) is
    /// first called.
    pub fn new(source: TokenSource, http: reqwest::Client) -> Self {
        Self {
            source,
            http,
            token: OnceCell::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// The access token, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Auth`] if the token source refuses or answers
    /// with something other than a token. A failed fetch is not cached; the
    /// next call tries again.
    pub async fn token(&self) -> Result<&str, SyncError> {
        self.token
            .get_or_try_init(|| self.fetch())
            .await
            .map(String::as_str)
    }

    /// How many fetches have been started. Never more than one once a fetch
    /// has succeeded.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Acquire)
    }

    async fn fetch(&self) -> Result<String, SyncError> {
        self.fetches.fetch_add(1, Ordering::AcqRel);
        match &self.source {
            TokenSource::Static(token) => {
                tracing::debug!("using static access token");
                Ok(token.clone())
            }
            TokenSource::Metadata { url } => {
                let endpoint = format!("{}{METADATA_TOKEN_PATH}", url.trim_end_matches('/'));
                tracing::debug!(%endpoint, "fetching access token from metadata server");

                let response = self
                    .http
                    .get(&endpoint)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| SyncError::Auth(format!("metadata request failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SyncError::Auth(format!(
                        "metadata server returned {status}"
                    )));
                }

                let body: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Auth(format!("metadata token parse failed: {e}")))?;
                Ok(body.access_token)
            }
        }
    }
}
