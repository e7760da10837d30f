//! Sheet store backends.
//!
//! Uses enum dispatch rather than trait objects because async methods are
//! not dyn-compatible. The Google backend talks to the Sheets v4 REST API
//! over `reqwest`; the memory backend keeps worksheets in process and
//! interprets the same typed batch envelope, for tests and dry runs.

use std::sync::Arc;

use armada_types::CellValue;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::auth::AuthHandle;
use crate::error::SyncError;
use crate::request::{BatchUpdateRequest, CellData, Request, RowData};

/// Identity of one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    /// Numeric worksheet id used in batch requests.
    pub sheet_id: i64,
    /// Worksheet title.
    pub title: String,
}

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// A sheet store that can list worksheets, read them, and apply batches.
#[derive(Debug)]
pub enum SheetBackend {
    /// Google Sheets v4 over HTTP.
    Google(GoogleSheets),
    /// In-process worksheets.
    Memory(MemorySheets),
}

impl SheetBackend {
    /// List worksheets.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and authentication failures.
    pub async fn sheets(&self) -> Result<Vec<SheetProperties>, SyncError> {
        match self {
            Self::Google(backend) => backend.sheets().await,
            Self::Memory(backend) => Ok(backend.sheets().await),
        }
    }

    /// Every row of a worksheet, header first, values unformatted.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and authentication failures;
    /// [`SyncError::UnknownSheet`] from the memory backend.
    pub async fn values(&self, title: &str) -> Result<Vec<Vec<Value>>, SyncError> {
        match self {
            Self::Google(backend) => backend.values(title).await,
            Self::Memory(backend) => backend.values(title).await,
        }
    }

    /// Apply a batch. The batch is applied completely or not at all.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and authentication failures;
    /// [`SyncError::UnknownSheet`] from the memory backend.
    pub async fn batch_update(&self, batch: &BatchUpdateRequest) -> Result<(), SyncError> {
        match self {
            Self::Google(backend) => backend.batch_update(batch).await,
            Self::Memory(backend) => backend.batch_update(batch).await,
        }
    }

    /// Append one row of raw values after the last row of a worksheet.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and authentication failures;
    /// [`SyncError::UnknownSheet`] from the memory backend.
    pub async fn append_values(&self, title: &str, values: &[CellValue]) -> Result<(), SyncError> {
        match self {
            Self::Google(backend) => backend.append_values(title, values).await,
            Self::Memory(backend) => backend.append_values(title, values).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Google(_) => "google",
            Self::Memory(_) => "memory",
        }
    }
}

// ---------------------------------------------------------------------------
// Google Sheets backend
// ---------------------------------------------------------------------------

/// Backend for the Google Sheets v4 REST API.
#[derive(Debug)]
pub struct GoogleSheets {
    http: reqwest::Client,
    api_url: String,
    spreadsheet_id: String,
    auth: AuthHandle,
}

#[derive(Deserialize)]
struct SpreadsheetMetadata {
    sheets: Option<Vec<SheetEntry>>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheets {
    /// Create a backend for one spreadsheet.
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        auth: AuthHandle,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        }
    }

    /// The authentication handle, shared by every call.
    pub const fn auth(&self) -> &AuthHandle {
        &self.auth
    }

    async fn sheets(&self) -> Result<Vec<SheetProperties>, SyncError> {
        let url = self.url(&[])?;
        let request = self
            .http
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let body: SpreadsheetMetadata = self.send(request).await?.json().await?;
        let sheets = body.sheets.ok_or_else(|| {
            SyncError::MalformedResponse(format!(
                "spreadsheet {} metadata lists no sheets",
                self.spreadsheet_id
            ))
        })?;
        Ok(sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn values(&self, title: &str) -> Result<Vec<Vec<Value>>, SyncError> {
        let url = self.url(&["values", &a1_range(title)])?;
        let request = self
            .http
            .get(url)
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")]);
        let body: ValueRange = self.send(request).await?.json().await?;
        tracing::debug!(title, rows = body.values.len(), "read worksheet");
        Ok(body.values)
    }

    async fn batch_update(&self, batch: &BatchUpdateRequest) -> Result<(), SyncError> {
        let mut url = self.url(&[])?;
        let path = format!("{}:batchUpdate", url.path());
        url.set_path(&path);
        let request = self.http.post(url).json(batch);
        self.send(request).await?;
        tracing::debug!(requests = batch.requests.len(), "batch update applied");
        Ok(())
    }

    async fn append_values(&self, title: &str, values: &[CellValue]) -> Result<(), SyncError> {
        let url = self.url(&["values", &format!("{}:append", a1_range(title))])?;
        let row: Vec<Value> = values.iter().map(CellValue::to_json).collect();
        let request = self
            .http
            .post(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&serde_json::json!({ "values": [row] }));
        self.send(request).await?;
        Ok(())
    }

    /// `{api_url}/spreadsheets/{id}/{segments...}`, each segment escaped.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, SyncError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| SyncError::Config(format!("invalid sheets API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SyncError::Config(format!("sheets API URL cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token, send, and turn non-success into an error.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let token = self.auth.token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// A1 range covering a whole worksheet.
fn a1_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-process worksheets. Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    store: Arc<RwLock<MemoryStore>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryStore {
    sheets: Vec<MemorySheet>,
    batch_calls: usize,
}

#[derive(Debug, Clone)]
struct MemorySheet {
    properties: SheetProperties,
    grid: Vec<Vec<CellValue>>,
}

impl MemoryStore {
    fn sheet_mut(&mut self, sheet_id: i64) -> Result<&mut MemorySheet, SyncError> {
        self.sheets
            .iter_mut()
            .find(|s| s.properties.sheet_id == sheet_id)
            .ok_or_else(|| SyncError::UnknownSheet(format!("sheet id {sheet_id}")))
    }

    fn by_title_mut(&mut self, title: &str) -> Result<&mut MemorySheet, SyncError> {
        self.sheets
            .iter_mut()
            .find(|s| s.properties.title == title)
            .ok_or_else(|| SyncError::UnknownSheet(title.to_owned()))
    }
}

impl MemorySheet {
    fn put(&mut self, row: usize, column: usize, value: CellValue) {
        if self.grid.len() <= row {
            self.grid.resize_with(row.saturating_add(1), Vec::new);
        }
        if let Some(cells) = self.grid.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column.saturating_add(1), CellValue::Empty);
            }
            if let Some(cell) = cells.get_mut(column) {
                *cell = value;
            }
        }
    }

    fn append(&mut self, cells: Vec<CellValue>) {
        while self
            .grid
            .last()
            .is_some_and(|row| row.iter().all(CellValue::is_empty))
        {
            self.grid.pop();
        }
        self.grid.push(cells);
    }

    fn apply(&mut self, request: &Request) {
        match request {
            Request::UpdateCells(update) => {
                for (i, row) in update.rows.iter().enumerate() {
                    for (j, cell) in row.values.iter().enumerate() {
                        self.put(
                            update.start.row_index.saturating_add(i),
                            update.start.column_index.saturating_add(j),
                            CellValue::from(cell),
                        );
                    }
                }
            }
            Request::AppendCells(append) => {
                for row in &append.rows {
                    self.append(cells_of(row));
                }
            }
        }
    }
}

fn cells_of(row: &RowData) -> Vec<CellValue> {
    row.values.iter().map(CellValue::from).collect()
}

const fn sheet_id_of(request: &Request) -> i64 {
    match request {
        Request::UpdateCells(update) => update.start.sheet_id,
        Request::AppendCells(append) => append.sheet_id,
    }
}

impl MemorySheets {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet holding `grid` (header row first). Returns its
    /// numeric id.
    pub async fn add_sheet(&self, title: impl Into<String>, grid: Vec<Vec<CellValue>>) -> i64 {
        let mut store = self.store.write().await;
        let sheet_id = store
            .sheets
            .iter()
            .map(|s| s.properties.sheet_id)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        store.sheets.push(MemorySheet {
            properties: SheetProperties {
                sheet_id,
                title: title.into(),
            },
            grid,
        });
        sheet_id
    }

    /// Current contents of a worksheet, if it exists.
    pub async fn grid(&self, title: &str) -> Option<Vec<Vec<CellValue>>> {
        self.store
            .read()
            .await
            .sheets
            .iter()
            .find(|s| s.properties.title == title)
            .map(|s| s.grid.clone())
    }

    /// Number of batches applied so far.
    pub async fn batch_calls(&self) -> usize {
        self.store.read().await.batch_calls
    }

    async fn sheets(&self) -> Vec<SheetProperties> {
        self.store
            .read()
            .await
            .sheets
            .iter()
            .map(|s| s.properties.clone())
            .collect()
    }

    async fn values(&self, title: &str) -> Result<Vec<Vec<Value>>, SyncError> {
        let store = self.store.read().await;
        let sheet = store
            .sheets
            .iter()
            .find(|s| s.properties.title == title)
            .ok_or_else(|| SyncError::UnknownSheet(title.to_owned()))?;
        Ok(sheet
            .grid
            .iter()
            .map(|row| {
                let used = row
                    .iter()
                    .rposition(|c| !c.is_empty())
                    .map_or(0, |last| last.saturating_add(1));
                row.iter().take(used).map(CellValue::to_json).collect()
            })
            .collect())
    }

    async fn batch_update(&self, batch: &BatchUpdateRequest) -> Result<(), SyncError> {
        let mut store = self.store.write().await;
        // Stage on a copy so a bad request leaves every sheet untouched.
        let mut staged = store.clone();
        for request in &batch.requests {
            staged.sheet_mut(sheet_id_of(request))?.apply(request);
        }
        staged.batch_calls = staged.batch_calls.saturating_add(1);
        *store = staged;
        Ok(())
    }

    async fn append_values(&self, title: &str, values: &[CellValue]) -> Result<(), SyncError> {
        self.store
            .write()
            .await
            .by_title_mut(title)?
            .append(values.to_vec());
        Ok(())
    }
}
