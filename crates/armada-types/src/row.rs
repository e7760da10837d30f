//! Row-shaped records exchanged with the spreadsheet store.
//!
//! A [`Row`] is a flat mapping from column name to [`CellValue`]. A
//! [`Dataset`] is an ordered sequence of rows together with the header that
//! names its columns. Absence is a first-class value ([`CellValue::Empty`]),
//! never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Largest integer an `f64` holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Shared empty cell returned for missing columns.
static EMPTY: CellValue = CellValue::Empty;

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A scalar spreadsheet cell.
///
/// Equality is exact: numbers compare bit-for-bit, so `NaN == NaN` and
/// `0.0 != -0.0`. Diffing relies on this to never report a cell as changed
/// when it was copied verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl CellValue {
    /// Whether the cell holds no value.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Convert a JSON value into a cell.
    ///
    /// `null` and the empty string become [`CellValue::Empty`]. Arrays and
    /// objects are stored as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Empty, Self::Number),
            Value::String(s) if s.is_empty() => Self::Empty,
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Convert the cell into a JSON value.
    ///
    /// Integral numbers inside the exactly-representable range become JSON
    /// integers so master-data IDs stay integers after a round trip.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

impl<T: Into<Self>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl core::fmt::Display for CellValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One record: column name to cell value.
///
/// Missing columns read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Create an empty row.
    pub const fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let cells = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, CellValue)| !v.is_empty())
            .collect();
        Self { cells }
    }

    /// Build a row from a flat JSON object.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self::from_pairs(object.iter().map(|(k, v)| (k.clone(), CellValue::from_json(v))))
    }

    /// Render the row as a flat JSON object over the given columns.
    ///
    /// Every listed column appears; empty cells become `null`.
    pub fn to_json_object(&self, columns: &[String]) -> Map<String, Value> {
        columns
            .iter()
            .map(|c| (c.clone(), self.get(c).to_json()))
            .collect()
    }

    /// The value in `column`, or [`CellValue::Empty`].
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// Set `column` to `value`. Setting [`CellValue::Empty`] removes the cell.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let value = value.into();
        let column = column.into();
        if value.is_empty() {
            self.cells.remove(&column);
        } else {
            self.cells.insert(column, value);
        }
    }

    /// Builder-style [`Row::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate the non-empty cells in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The row's values laid out in `columns` order, empty where missing.
    pub fn values_in(&self, columns: &[String]) -> Vec<CellValue> {
        columns.iter().map(|c| self.get(c).clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// An ordered set of rows for one sheet, with its header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Rows in sheet order.
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset with the given header and rows.
    pub const fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build a dataset from a header and a grid of raw values.
    ///
    /// Short rows are padded with empty cells; values beyond the header are
    /// dropped.
    pub fn from_grid(columns: Vec<String>, grid: Vec<Vec<CellValue>>) -> Self {
        let rows = grid
            .into_iter()
            .map(|values| Row::from_pairs(columns.iter().cloned().zip(values)))
            .collect();
        Self { columns, rows }
    }

    /// Build a dataset from an array of flat JSON objects.
    ///
    /// The header is the union of keys in first-seen order.
    pub fn from_json_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records.iter().map(Row::from_json_object).collect();
        Self { columns, rows }
    }

    /// Render every row as a flat JSON object over the header.
    pub fn to_json_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| row.to_json_object(&self.columns))
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

/// The declared columns of one record kind, with its identity column.
///
/// Diffing iterates `columns` by name, so behavior never depends on the
/// incidental key order of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column whose value identifies a row.
    pub identity: String,
    /// All columns in sheet order, identity included.
    pub columns: Vec<String>,
}

impl ColumnSchema {
    /// Create a schema. The identity column is appended if missing.
    pub fn new(identity: impl Into<String>, columns: Vec<String>) -> Self {
        let identity = identity.into();
        let mut columns = columns;
        if !columns.contains(&identity) {
            columns.push(identity.clone());
        }
        Self { identity, columns }
    }

    /// Zero-based position of `column` in the schema.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn nan_equals_itself() {
        assert_eq!(CellValue::Number(f64::NAN), CellValue::Number(f64::NAN));
        assert_ne!(CellValue::Number(0.0), CellValue::Number(-0.0));
        assert_ne!(CellValue::Number(1.0), CellValue::Text("1".to_owned()));
    }

    #[test]
    fn missing_column_reads_empty() {
        let row = Row::new().with("id", 1);
        assert!(row.get("hp").is_empty());
        assert_eq!(row.get("id"), &CellValue::Number(1.0));
    }

    #[test]
    fn setting_empty_removes_cell() {
        let mut row = Row::new().with("name", "A");
        row.set("name", CellValue::Empty);
        assert!(row.is_empty());
    }

    #[test]
    fn integral_numbers_become_json_integers() {
        assert_eq!(CellValue::Number(12.0).to_json(), json!(12));
        assert_eq!(CellValue::Number(1.5).to_json(), json!(1.5));
        assert_eq!(CellValue::Empty.to_json(), Value::Null);
    }

    #[test]
    fn empty_string_reads_as_empty() {
        assert!(CellValue::from_json(&json!("")).is_empty());
        assert!(CellValue::from(String::new()).is_empty());
    }

    #[test]
    fn grid_pads_short_rows() {
        let ds = Dataset::from_grid(
            vec!["id".to_owned(), "hp".to_owned(), "name".to_owned()],
            vec![vec![CellValue::from(1), CellValue::from(10)]],
        );
        assert_eq!(ds.len(), 1);
        let row = ds.rows.first().cloned().unwrap_or_default();
        assert!(row.get("name").is_empty());
        assert_eq!(
            row.values_in(&ds.columns),
            vec![CellValue::from(1), CellValue::from(10), CellValue::Empty]
        );
    }

    #[test]
    fn json_records_keep_first_seen_header_order() {
        let records: Vec<Map<String, Value>> = vec![
            json!({"gear_id": 1, "name": "A"}),
            json!({"gear_id": 2, "range": 3}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let ds = Dataset::from_json_records(&records);
        assert_eq!(ds.columns, ["gear_id", "name", "range"]);
        let back = ds.to_json_records();
        assert_eq!(
            back.first().map(|o| Value::Object(o.clone())),
            Some(json!({"gear_id": 1, "name": "A", "range": null}))
        );
    }

    #[test]
    fn schema_appends_missing_identity() {
        let schema = ColumnSchema::new("id", vec!["hp".to_owned()]);
        assert_eq!(schema.columns, ["hp", "id"]);
        assert_eq!(schema.position("id"), Some(1));
    }
}
