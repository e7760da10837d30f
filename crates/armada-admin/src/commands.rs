//! The admin commands.
//!
//! - `update-data`: read every configured worksheet concurrently, turn each
//!   into a record array, merge into the stored master data, and save.
//! - `push`: diff a locally computed record array against its worksheet
//!   and apply the resulting cell updates and appends.

use std::path::Path;

use armada_master::{MasterData, MasterDataStore, MergeKeys};
use armada_sync::{Operation, SheetRegistry, SheetSyncClient};
use armada_types::Dataset;
use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::admin_log::AdminLog;
use crate::config::AdminConfig;
use crate::error::AdminError;

/// Everything a command needs, wired from configuration.
#[derive(Debug)]
pub struct Admin {
    client: SheetSyncClient,
    registry: SheetRegistry,
    categories: Vec<String>,
    keys: MergeKeys,
    store: MasterDataStore,
    log_sheet: String,
}

impl Admin {
    /// Wire the commands for `config` against the Google Sheets API.
    pub fn from_config(config: &AdminConfig) -> Self {
        let registry = config.import.registry();
        Self::new(
            SheetSyncClient::google(&config.sheets),
            config.import.categories(&registry),
            registry,
            config.import.merge_keys(),
            MasterDataStore::new(&config.master_data_path),
            config.admin_log_sheet.clone(),
        )
    }

    /// Wire the commands from explicit parts.
    pub const fn new(
        client: SheetSyncClient,
        categories: Vec<String>,
        registry: SheetRegistry,
        keys: MergeKeys,
        store: MasterDataStore,
        log_sheet: String,
    ) -> Self {
        Self {
            client,
            registry,
            categories,
            keys,
            store,
            log_sheet,
        }
    }

    fn log(&self) -> AdminLog<'_> {
        AdminLog::new(&self.client, &self.log_sheet)
    }

    /// Import the configured worksheets into the master-data document.
    ///
    /// Returns the document as saved.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable worksheet, or if the document cannot
    /// be loaded or saved. Nothing is saved after a failed read.
    pub async fn update_data(&self) -> Result<MasterData, AdminError> {
        self.log().log("Start: update_data").await?;

        let partial = self.read_master_data().await?;
        let saved = self.store.merge_and_save(&partial, &self.keys).await?;

        self.log().log("Success: update_data").await?;
        Ok(saved)
    }

    /// Read every configured worksheet concurrently into one partial
    /// document.
    ///
    /// # Errors
    ///
    /// Returns the first unknown category or failed read.
    pub async fn read_master_data(&self) -> Result<MasterData, AdminError> {
        let reads = self.categories.iter().map(|category| async move {
            let title = self.registry.title(category)?;
            let dataset = self.client.read_all(title).await?;
            tracing::debug!(category, title, rows = dataset.len(), "read category");
            Ok::<_, AdminError>((category.clone(), dataset))
        });
        let datasets = try_join_all(reads).await?;
        tracing::info!(categories = datasets.len(), "read master data from spreadsheet");
        Ok(MasterData::from_datasets(datasets))
    }

    /// Diff the records in `file` against the worksheet of `category` and
    /// apply the result unless `dry_run`. Returns the operations.
    ///
    /// Rows are matched on the category's first merge key.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidInput`] if the category has no key or
    /// the file is not an array of objects; propagates read and sync
    /// failures.
    pub async fn push(
        &self,
        category: &str,
        file: &Path,
        dry_run: bool,
    ) -> Result<Vec<Operation>, AdminError> {
        let identity = self
            .keys
            .get(category)
            .and_then(<[String]>::first)
            .ok_or_else(|| AdminError::InvalidInput {
                message: format!("category {category} has no merge key to match rows on"),
            })?;
        let title = self.registry.title(category)?;
        let next = read_records(file).await?;

        let operations = if dry_run {
            let previous = self.client.read_all(title).await?;
            armada_sync::diff(&previous, &next, identity)
        } else {
            self.client.sync(title, &next, identity).await?
        };
        tracing::info!(
            category,
            title,
            operations = operations.len(),
            dry_run,
            "pushed records"
        );
        Ok(operations)
    }
}

/// Read a JSON array of flat objects as a dataset.
async fn read_records(file: &Path) -> Result<Dataset, AdminError> {
    let bytes = tokio::fs::read(file).await.map_err(|source| AdminError::Io {
        path: file.display().to_string(),
        source,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| AdminError::InvalidInput {
        message: format!("{}: {e}", file.display()),
    })?;
    let Value::Array(items) = value else {
        return Err(AdminError::InvalidInput {
            message: format!("{}: expected an array of records", file.display()),
        });
    };
    let records = items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(AdminError::InvalidInput {
                message: format!("{}: expected a record, found {other}", file.display()),
            }),
        })
        .collect::<Result<Vec<Map<String, Value>>, _>>()?;
    Ok(Dataset::from_json_records(&records))
}
