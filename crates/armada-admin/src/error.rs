//! Error types for the admin binary.
//!
//! [`AdminError`] wraps every failure a command can hit so `main` can
//! propagate with `?`.

/// Top-level error for the admin binary.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Configuration is missing or invalid.
    #[error("config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The configuration YAML could not be parsed.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// Reading or writing the sheet store failed.
    #[error("sync error: {source}")]
    Sync {
        /// The underlying sync error.
        #[from]
        source: armada_sync::SyncError,
    },

    /// Loading, merging or saving the master data failed.
    #[error("master data error: {source}")]
    Master {
        /// The underlying master-data error.
        #[from]
        source: armada_master::MasterError,
    },

    /// A local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Input records are not a JSON array of objects.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}
