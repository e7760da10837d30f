//! File-backed persistence for the master-data document.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::document::MasterData;
use crate::error::MasterError;
use crate::merge::{MergeKeys, merge};

/// Reads and writes the master-data document at one path.
#[derive(Debug, Clone)]
pub struct MasterDataStore {
    path: PathBuf,
}

impl MasterDataStore {
    /// Create a store for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file is an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::Io`] if the file exists but cannot be read,
    /// [`MasterError::Serialization`] if it is not JSON, and
    /// [`MasterError::MalformedDocument`] if it is not a document.
    pub async fn load(&self) -> Result<MasterData, MasterError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no master data yet, starting empty");
                return Ok(MasterData::new());
            }
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_slice(&bytes)?;
        let data = MasterData::from_value(value)?;
        tracing::debug!(path = %self.path.display(), categories = data.len(), "loaded master data");
        Ok(data)
    }

    /// Stamp `created_at` with the current time and write the document
    /// atomically. Returns the document as written.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::Io`] if the temp file cannot be written or
    /// renamed into place.
    pub async fn save(&self, mut data: MasterData) -> Result<MasterData, MasterError> {
        data.created_at = Some(Utc::now().timestamp_millis());
        let bytes = serde_json::to_vec(&data.to_value())?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(std::io::Error::other)??;
        tracing::info!(
            path = %self.path.display(),
            categories = data.len(),
            created_at = ?data.created_at,
            "saved master data"
        );
        Ok(data)
    }

    /// Load, merge `partial` into the stored document, and save.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load) and [`save`](Self::save).
    pub async fn merge_and_save(
        &self,
        partial: &MasterData,
        keys: &MergeKeys,
    ) -> Result<MasterData, MasterError> {
        let canonical = self.load().await?;
        self.save(merge(&canonical, partial, keys)).await
    }
}

/// Write through a temp file in the destination directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
