//! Error types for master-data persistence.

/// Errors that can occur while loading or saving the master-data document.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// Reading, writing or renaming the document file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON, or could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document is valid JSON of the wrong shape.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}
