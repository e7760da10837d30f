//! Typed `spreadsheets.batchUpdate` request envelope.
//!
//! Both backends consume the same envelope: the Google backend posts it as
//! JSON, the in-memory backend interprets it directly. Cell offsets are
//! zero-based with the header at row 0, so dataset row `r` lives at sheet
//! row `r + 1`.

use armada_types::CellValue;
use serde::{Deserialize, Serialize};

use crate::diff::Operation;
use crate::error::SyncError;

/// Field mask sent with every write: only the entered value changes.
pub const VALUE_FIELDS: &str = "userEnteredValue";

/// Body of a `spreadsheets/{id}:batchUpdate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    /// Requests, applied by the API in order.
    pub requests: Vec<Request>,
}

impl BatchUpdateRequest {
    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// One request inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    /// Overwrite cells starting at a coordinate.
    UpdateCells(UpdateCellsRequest),
    /// Append rows after the last non-empty row.
    AppendCells(AppendCellsRequest),
}

/// Overwrite a block of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCellsRequest {
    /// Top-left cell of the block.
    pub start: GridCoordinate,
    /// Row data, one entry per sheet row.
    pub rows: Vec<RowData>,
    /// Field mask.
    pub fields: String,
}

/// Append rows to a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCellsRequest {
    /// Numeric worksheet id.
    pub sheet_id: i64,
    /// Rows to append.
    pub rows: Vec<RowData>,
    /// Field mask.
    pub fields: String,
}

/// A zero-based cell position in one worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    /// Numeric worksheet id.
    pub sheet_id: i64,
    /// Zero-based row; the header is row 0.
    pub row_index: usize,
    /// Zero-based column.
    pub column_index: usize,
}

/// Cells of one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowData {
    /// Cells in column order.
    pub values: Vec<CellData>,
}

/// One cell. An absent value clears the cell under the `userEnteredValue`
/// mask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    /// The value to enter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_entered_value: Option<ExtendedValue>,
}

/// A typed cell value as the API spells it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedValue {
    /// Numeric value.
    NumberValue(f64),
    /// Text value.
    StringValue(String),
    /// Boolean value.
    BoolValue(bool),
}

impl From<&CellValue> for CellData {
    fn from(cell: &CellValue) -> Self {
        let user_entered_value = match cell {
            CellValue::Empty => None,
            CellValue::Bool(b) => Some(ExtendedValue::BoolValue(*b)),
            CellValue::Number(n) => Some(ExtendedValue::NumberValue(*n)),
            CellValue::Text(s) => Some(ExtendedValue::StringValue(s.clone())),
        };
        Self { user_entered_value }
    }
}

impl From<&CellData> for CellValue {
    fn from(cell: &CellData) -> Self {
        match &cell.user_entered_value {
            None => Self::Empty,
            Some(ExtendedValue::BoolValue(b)) => Self::Bool(*b),
            Some(ExtendedValue::NumberValue(n)) => Self::Number(*n),
            Some(ExtendedValue::StringValue(s)) => Self::from(s.as_str()),
        }
    }
}

impl RowData {
    /// Row data for a slice of cells.
    pub fn from_cells(cells: &[CellValue]) -> Self {
        Self {
            values: cells.iter().map(CellData::from).collect(),
        }
    }
}

/// Translate diff operations into one batch for worksheet `sheet_id`.
///
/// Columns are resolved by name against `header`: an `UpdateCell` targets
/// its column's header position, and an `AppendRow` is laid out over the
/// full header with absent columns left empty.
///
/// # Errors
///
/// Returns [`SyncError::UnknownColumn`] if an operation names a column the
/// header lacks.
pub fn build_batch(
    sheet: &str,
    sheet_id: i64,
    header: &[String],
    operations: &[Operation],
) -> Result<BatchUpdateRequest, SyncError> {
    let requests = operations
        .iter()
        .map(|op| match op {
            Operation::UpdateCell { row, column, value } => {
                Ok(Request::UpdateCells(UpdateCellsRequest {
                    start: GridCoordinate {
                        sheet_id,
                        row_index: row.saturating_add(1),
                        column_index: column_index(sheet, header, column)?,
                    },
                    rows: vec![RowData::from_cells(core::slice::from_ref(value))],
                    fields: VALUE_FIELDS.to_owned(),
                }))
            }
            Operation::AppendRow { columns, values } => {
                let mut cells = vec![CellValue::Empty; header.len()];
                for (column, value) in columns.iter().zip(values) {
                    let index = column_index(sheet, header, column)?;
                    if let Some(cell) = cells.get_mut(index) {
                        cell.clone_from(value);
                    }
                }
                Ok(Request::AppendCells(AppendCellsRequest {
                    sheet_id,
                    rows: vec![RowData::from_cells(&cells)],
                    fields: VALUE_FIELDS.to_owned(),
                }))
            }
        })
        .collect::<Result<Vec<_>, SyncError>>()?;
    Ok(BatchUpdateRequest { requests })
}

/// Write `header` into the first row of worksheet `sheet_id`.
pub fn header_request(sheet_id: i64, header: &[String]) -> Request {
    let cells: Vec<CellValue> = header.iter().map(|c| CellValue::from(c.as_str())).collect();
    Request::UpdateCells(UpdateCellsRequest {
        start: GridCoordinate {
            sheet_id,
            row_index: 0,
            column_index: 0,
        },
        rows: vec![RowData::from_cells(&cells)],
        fields: VALUE_FIELDS.to_owned(),
    })
}

fn column_index(sheet: &str, header: &[String], column: &str) -> Result<usize, SyncError> {
    header
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| SyncError::UnknownColumn {
            sheet: sheet.to_owned(),
            column: column.to_owned(),
        })
}
