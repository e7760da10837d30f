//! Error types for spreadsheet synchronization.
//!
//! Transport and HTTP status failures are propagated verbatim; nothing in
//! this crate retries. A batch that failed is assumed not to have been
//! applied.

/// Errors that can occur while reading from or writing to the sheet store.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("sheets API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// An access token could not be obtained.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No worksheet with this title (or registry key) exists.
    #[error("unknown sheet: {0}")]
    UnknownSheet(String),

    /// An operation names a column missing from the sheet header.
    #[error("unknown column {column} in sheet {sheet}")]
    UnknownColumn {
        /// Worksheet title.
        sheet: String,
        /// The column that was not found.
        column: String,
    },

    /// The API answered with a body of an unexpected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}
