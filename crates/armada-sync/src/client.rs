//! The sync client: reads worksheets as datasets and applies operations.

use std::collections::BTreeMap;

use armada_types::{CellValue, ColumnSchema, Dataset};
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};

use crate::auth::AuthHandle;
use crate::backend::{GoogleSheets, MemorySheets, SheetBackend, SheetProperties};
use crate::config::SheetsConfig;
use crate::diff::{Operation, diff};
use crate::error::SyncError;
use crate::request::{BatchUpdateRequest, build_batch, header_request};

/// Reads and writes one spreadsheet through a [`SheetBackend`].
///
/// Worksheet metadata is fetched once and cached; headers are cached per
/// worksheet after the first read.
#[derive(Debug)]
pub struct SheetSyncClient {
    backend: SheetBackend,
    sheets: OnceCell<Vec<SheetProperties>>,
    headers: RwLock<BTreeMap<String, Vec<String>>>,
}

impl SheetSyncClient {
    /// Wrap a backend.
    pub fn new(backend: SheetBackend) -> Self {
        Self {
            backend,
            sheets: OnceCell::new(),
            headers: RwLock::new(BTreeMap::new()),
        }
    }

    /// A client for the Google Sheets API described by `config`.
    pub fn google(config: &SheetsConfig) -> Self {
        let http = reqwest::Client::new();
        let auth = AuthHandle::new(config.token_source(), http.clone());
        Self::new(SheetBackend::Google(GoogleSheets::new(
            http,
            config.api_url.clone(),
            config.spreadsheet_id.clone(),
            auth,
        )))
    }

    /// A client over in-process worksheets.
    pub fn memory(memory: MemorySheets) -> Self {
        Self::new(SheetBackend::Memory(memory))
    }

    /// The backend in use.
    pub const fn backend(&self) -> &SheetBackend {
        &self.backend
    }

    /// Every row of a worksheet as a dataset; columns come from the header
    /// row in header order.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn read_all(&self, title: &str) -> Result<Dataset, SyncError> {
        let mut rows = self.backend.values(title).await?.into_iter();
        let header: Vec<String> = rows
            .next()
            .unwrap_or_default()
            .iter()
            .map(header_name)
            .collect();
        let grid: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(CellValue::from_json).collect())
            .collect();

        self.headers
            .write()
            .await
            .insert(title.to_owned(), header.clone());

        let dataset = Dataset::from_grid(header, grid);
        tracing::debug!(title, rows = dataset.len(), columns = dataset.columns.len(), "read dataset");
        Ok(dataset)
    }

    /// The header row of a worksheet, from cache when it has been read.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn header(&self, title: &str) -> Result<Vec<String>, SyncError> {
        if let Some(header) = self.headers.read().await.get(title) {
            return Ok(header.clone());
        }
        Ok(self.read_all(title).await?.columns)
    }

    /// Apply diff operations to a worksheet in one batch.
    ///
    /// An empty list performs no call. Returns the number of requests sent.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownSheet`] if no worksheet has this title,
    /// [`SyncError::UnknownColumn`] if an update names a column the header
    /// lacks; otherwise propagates backend failures.
    pub async fn apply(&self, title: &str, operations: &[Operation]) -> Result<usize, SyncError> {
        if operations.is_empty() {
            tracing::debug!(title, "nothing to apply");
            return Ok(0);
        }
        let sheet_id = self.properties(title).await?.sheet_id;
        let header = self.header(title).await?;
        let batch = build_batch(title, sheet_id, &header, operations)?;
        self.send(title, &batch).await
    }

    async fn send(&self, title: &str, batch: &BatchUpdateRequest) -> Result<usize, SyncError> {
        self.backend.batch_update(batch).await?;
        tracing::info!(
            title,
            backend = self.backend.name(),
            requests = batch.requests.len(),
            "applied operations"
        );
        Ok(batch.requests.len())
    }

    /// Append one raw row after the last row of a worksheet.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn append_row(&self, title: &str, values: &[CellValue]) -> Result<(), SyncError> {
        self.backend.append_values(title, values).await
    }

    /// Read a worksheet, diff it against `next` on `identity`, and apply the
    /// result. Returns the operations applied.
    ///
    /// A worksheet without a header row gets one from `next`'s columns,
    /// written in the same batch as the rows.
    ///
    /// # Errors
    ///
    /// See [`read_all`](Self::read_all) and [`apply`](Self::apply).
    pub async fn sync(
        &self,
        title: &str,
        next: &Dataset,
        identity: &str,
    ) -> Result<Vec<Operation>, SyncError> {
        let previous = self.read_all(title).await?;
        let operations = diff(&previous, next, identity);
        if operations.is_empty() || !previous.columns.is_empty() {
            self.apply(title, &operations).await?;
            return Ok(operations);
        }

        let header = ColumnSchema::new(identity, next.columns.clone()).columns;
        let sheet_id = self.properties(title).await?.sheet_id;
        let mut batch = build_batch(title, sheet_id, &header, &operations)?;
        batch.requests.insert(0, header_request(sheet_id, &header));
        self.send(title, &batch).await?;
        tracing::info!(title, columns = header.len(), "wrote header to empty worksheet");
        self.headers.write().await.insert(title.to_owned(), header);
        Ok(operations)
    }

    async fn properties(&self, title: &str) -> Result<SheetProperties, SyncError> {
        let sheets = self
            .sheets
            .get_or_try_init(|| self.backend.sheets())
            .await?;
        sheets
            .iter()
            .find(|s| s.title == title)
            .cloned()
            .ok_or_else(|| SyncError::UnknownSheet(title.to_owned()))
    }
}

fn header_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
