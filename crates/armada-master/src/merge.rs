//! Merging a partial master-data document into the canonical one.
//!
//! For every category in the partial document:
//!
//! - record arrays with declared key columns are merged record by record: a
//!   record whose key tuple matches replaces the canonical record in place,
//!   an unmatched record is appended, and canonical records the partial does
//!   not mention are kept;
//! - anything else (no declared keys, configuration objects, scalars) is
//!   replaced wholesale.
//!
//! Categories absent from the partial are untouched. Partial records are
//! applied in order, so duplicates inside one partial collapse to the last
//! one. Merging the same partial twice gives the same document as merging
//! it once.

use std::collections::BTreeMap;

use armada_types::CellValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::MasterData;

/// Built-in key columns per category.
const DEFAULT_KEYS: &[(&str, &str)] = &[
    ("gears", "gear_id"),
    ("ships", "ship_id"),
    ("gear_attrs", "tag"),
    ("ship_attrs", "tag"),
];

/// Key columns per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeKeys {
    keys: BTreeMap<String, Vec<String>>,
}

impl Default for MergeKeys {
    fn default() -> Self {
        Self {
            keys: DEFAULT_KEYS
                .iter()
                .map(|&(category, key)| (category.to_owned(), vec![key.to_owned()]))
                .collect(),
        }
    }
}

impl MergeKeys {
    /// No declared keys: every category is replaced wholesale.
    pub const fn none() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Declare (or redeclare) the key columns of a category.
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, columns: &[&str]) -> Self {
        self.keys.insert(
            category.into(),
            columns.iter().map(|&c| c.to_owned()).collect(),
        );
        self
    }

    /// Apply overrides. An empty column list removes the category's keys.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Self {
        for (category, columns) in overrides {
            if columns.is_empty() {
                self.keys.remove(category);
            } else {
                self.keys.insert(category.clone(), columns.clone());
            }
        }
        self
    }

    /// Key columns of a category, if it declares any.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.keys
            .get(category)
            .map(Vec::as_slice)
            .filter(|columns| !columns.is_empty())
    }
}

/// Counts from one merge, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Categories replaced wholesale.
    pub replaced_categories: usize,
    /// Canonical records replaced by a matching partial record.
    pub replaced_records: usize,
    /// Partial records appended.
    pub appended_records: usize,
}

/// Merge `partial` into `canonical`.
///
/// `canonical.created_at` is kept; saving stamps a fresh one.
pub fn merge(canonical: &MasterData, partial: &MasterData, keys: &MergeKeys) -> MasterData {
    merge_with_summary(canonical, partial, keys).0
}

/// [`merge`], also returning what changed.
pub fn merge_with_summary(
    canonical: &MasterData,
    partial: &MasterData,
    keys: &MergeKeys,
) -> (MasterData, MergeSummary) {
    let mut merged = canonical.clone();
    let mut summary = MergeSummary::default();

    for (category, incoming) in partial.iter() {
        let key = keys.get(category);
        let existing = canonical.get(category);
        let value = match (key, incoming, existing) {
            (Some(key), Value::Array(records), None | Some(Value::Array(_))) => {
                let base = existing.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
                let (records, replaced, appended) = merge_records(base, records, key);
                summary.replaced_records = summary.replaced_records.saturating_add(replaced);
                summary.appended_records = summary.appended_records.saturating_add(appended);
                tracing::debug!(category, replaced, appended, "merged records");
                Value::Array(records)
            }
            _ => {
                summary.replaced_categories = summary.replaced_categories.saturating_add(1);
                tracing::debug!(category, "replaced category");
                incoming.clone()
            }
        };
        merged.insert(category, value);
    }

    tracing::info!(
        categories = partial.len(),
        replaced_categories = summary.replaced_categories,
        replaced_records = summary.replaced_records,
        appended_records = summary.appended_records,
        "merged master data"
    );
    (merged, summary)
}

/// Merge one record array on `key`. Returns the records and the counts of
/// replaced and appended records.
///
/// A partial record without a full key (not an object, or a key column
/// missing or null) is appended unless an identical record already exists.
pub fn merge_records(
    canonical: &[Value],
    partial: &[Value],
    key: &[String],
) -> (Vec<Value>, usize, usize) {
    let mut records = canonical.to_vec();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for (position, record) in records.iter().enumerate() {
        if let Some(k) = key_of(record, key) {
            index.entry(k).or_insert(position);
        }
    }

    let mut replaced = 0_usize;
    let mut appended = 0_usize;
    for record in partial {
        match key_of(record, key) {
            Some(k) => {
                if let Some(slot) = index.get(&k).and_then(|&p| records.get_mut(p)) {
                    slot.clone_from(record);
                    replaced = replaced.saturating_add(1);
                } else {
                    index.insert(k, records.len());
                    records.push(record.clone());
                    appended = appended.saturating_add(1);
                }
            }
            None if records.contains(record) => {}
            None => {
                tracing::warn!("appending record without a complete key");
                records.push(record.clone());
                appended = appended.saturating_add(1);
            }
        }
    }
    (records, replaced, appended)
}

/// The key tuple of a record as a comparable string. Integral numbers are
/// normalized so `2` and `2.0` match.
fn key_of(record: &Value, key: &[String]) -> Option<String> {
    let object = record.as_object()?;
    let parts = key
        .iter()
        .map(|column| {
            let cell = CellValue::from_json(object.get(column)?);
            (!cell.is_empty()).then(|| cell.to_json())
        })
        .collect::<Option<Vec<Value>>>()?;
    Some(Value::Array(parts).to_string())
}
