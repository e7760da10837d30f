//! Row diffing: the minimal cell-level operations that turn one dataset into
//! another.
//!
//! Rows are matched by the value of one identity column. Matched rows are
//! compared column by column over an explicit schema; unmatched rows of the
//! new dataset are appended. Rows present only in the previous dataset are
//! never touched, so a sync never deletes.

use std::collections::{BTreeMap, BTreeSet};

use armada_types::{CellValue, ColumnSchema, Dataset, Row};
use serde::{Deserialize, Serialize};

/// One change to apply to the sheet store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Overwrite one cell of an existing row.
    UpdateCell {
        /// Zero-based position of the row in the previous dataset.
        row: usize,
        /// Column name.
        column: String,
        /// New value; [`CellValue::Empty`] clears the cell.
        value: CellValue,
    },
    /// Append a new row after the last one.
    ///
    /// Values are named so the row can be laid out by the worksheet header,
    /// whatever order the schema lists its columns in.
    AppendRow {
        /// Schema columns, in schema order.
        columns: Vec<String>,
        /// One value per entry of `columns`.
        values: Vec<CellValue>,
    },
}

/// Compares datasets over a declared column schema.
#[derive(Debug, Clone)]
pub struct RowDiffer {
    schema: ColumnSchema,
}

impl RowDiffer {
    /// Create a differ for `schema`.
    pub const fn new(schema: ColumnSchema) -> Self {
        Self { schema }
    }

    /// The schema this differ compares over.
    pub const fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Compute the operations that bring `previous` in line with `next`.
    ///
    /// Output follows `next` row order. `diff(d, d)` is always empty.
    pub fn diff(&self, previous: &[Row], next: &[Row]) -> Vec<Operation> {
        let identity = self.schema.identity.as_str();

        let mut index: BTreeMap<IdentityKey, usize> = BTreeMap::new();
        for (position, row) in previous.iter().enumerate() {
            if let Some(key) = IdentityKey::of(row.get(identity)) {
                index.entry(key).or_insert(position);
            }
        }

        let mut seen = BTreeSet::new();
        let mut operations = Vec::new();
        for (position, row) in next.iter().enumerate() {
            let Some(key) = IdentityKey::of(row.get(identity)) else {
                tracing::warn!(position, identity, "skipping row without identity");
                continue;
            };
            if !seen.insert(key.clone()) {
                tracing::warn!(
                    position,
                    identity,
                    value = %row.get(identity),
                    "skipping row with repeated identity"
                );
                continue;
            }

            match index.get(&key).and_then(|&r| previous.get(r).map(|p| (r, p))) {
                Some((r, before)) => self.diff_row(r, before, row, &mut operations),
                None => operations.push(Operation::AppendRow {
                    columns: self.schema.columns.clone(),
                    values: row.values_in(&self.schema.columns),
                }),
            }
        }

        tracing::debug!(
            previous = previous.len(),
            next = next.len(),
            operations = operations.len(),
            "diffed datasets"
        );
        operations
    }

    fn diff_row(&self, row: usize, before: &Row, after: &Row, out: &mut Vec<Operation>) {
        for column in &self.schema.columns {
            if *column == self.schema.identity {
                continue;
            }
            let value = after.get(column);
            if before.get(column) != value {
                out.push(Operation::UpdateCell {
                    row,
                    column: column.clone(),
                    value: value.clone(),
                });
            }
        }
    }
}

/// Diff two datasets, matching rows on `identity`.
///
/// The schema is the previous header when it has one, otherwise the next
/// header. Columns outside the schema are ignored.
pub fn diff(previous: &Dataset, next: &Dataset, identity: &str) -> Vec<Operation> {
    let columns = if previous.columns.is_empty() {
        next.columns.clone()
    } else {
        previous.columns.clone()
    };
    RowDiffer::new(ColumnSchema::new(identity, columns)).diff(&previous.rows, &next.rows)
}

/// Ordered, hashable stand-in for an identity cell.
///
/// Numbers key on their bit pattern so matching agrees with cell equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum IdentityKey {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl IdentityKey {
    fn of(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Empty => None,
            CellValue::Bool(b) => Some(Self::Bool(*b)),
            CellValue::Number(n) => Some(Self::Number(n.to_bits())),
            CellValue::Text(s) => Some(Self::Text(s.clone())),
        }
    }
}
