//! Connection settings for the Sheets API, loaded from the environment.

use crate::auth::TokenSource;
use crate::error::SyncError;

/// Default Sheets v4 endpoint.
pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com/v4";

/// Default compute metadata server.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

/// How to reach one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    /// Spreadsheet to read and write.
    pub spreadsheet_id: String,
    /// Base URL of the Sheets API.
    pub api_url: String,
    /// Pre-issued bearer token. When absent the metadata server is asked.
    pub access_token: Option<String>,
    /// Base URL of the compute metadata server.
    pub metadata_url: String,
}

impl SheetsConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SPREADSHEET_ID` -- spreadsheet holding the master data
    ///
    /// Optional variables:
    /// - `SHEETS_API_URL` -- API base URL (default `https://sheets.googleapis.com/v4`)
    /// - `SHEETS_ACCESS_TOKEN` -- bearer token; skips the metadata server
    /// - `GCE_METADATA_URL` -- metadata server (default `http://metadata.google.internal`)
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if `SPREADSHEET_ID` is unset or empty.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if `SPREADSHEET_ID` is missing or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let spreadsheet_id = lookup("SPREADSHEET_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SyncError::Config("missing required env var SPREADSHEET_ID".to_owned()))?;
        let api_url = lookup("SHEETS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let access_token = lookup("SHEETS_ACCESS_TOKEN").filter(|v| !v.is_empty());
        let metadata_url =
            lookup("GCE_METADATA_URL").unwrap_or_else(|| DEFAULT_METADATA_URL.to_owned());

        Ok(Self {
            spreadsheet_id,
            api_url,
            access_token,
            metadata_url,
        })
    }

    /// The token source these settings select.
    pub fn token_source(&self) -> TokenSource {
        self.access_token.as_ref().map_or_else(
            || TokenSource::Metadata {
                url: self.metadata_url.clone(),
            },
            |token| TokenSource::Static(token.clone()),
        )
    }
}
