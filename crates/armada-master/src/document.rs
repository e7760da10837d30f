//! The master-data document.
//!
//! One JSON object whose top-level keys are categories (`gears`, `ships`,
//! `ship_banners`, `constants`, ...) plus a `created_at` millisecond
//! timestamp stamped on save. Category values are usually record arrays
//! but may be arbitrary configuration objects.

use armada_types::Dataset;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::MasterError;

/// Key holding the save timestamp; never a category.
pub const CREATED_AT: &str = "created_at";

/// The whole master-data document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MasterData {
    /// Milliseconds since the Unix epoch at the last save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    categories: Map<String, Value>,
}

impl MasterData {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret a parsed JSON value as a document.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::MalformedDocument`] if the value is not an
    /// object or `created_at` is present but not an integer.
    pub fn from_value(value: Value) -> Result<Self, MasterError> {
        let Value::Object(mut categories) = value else {
            return Err(MasterError::MalformedDocument(format!(
                "expected a JSON object, found {}",
                kind_of(&value)
            )));
        };
        let created_at = match categories.remove(CREATED_AT) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_i64().ok_or_else(|| {
                MasterError::MalformedDocument(format!("{CREATED_AT} is not an integer: {n}"))
            })?),
            Some(other) => {
                return Err(MasterError::MalformedDocument(format!(
                    "{CREATED_AT} must be a number, found {}",
                    kind_of(&other)
                )));
            }
        };
        Ok(Self {
            created_at,
            categories,
        })
    }

    /// The document as one JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = self.categories.clone();
        if let Some(millis) = self.created_at {
            object.insert(CREATED_AT.to_owned(), Value::from(millis));
        }
        Value::Object(object)
    }

    /// Build a document from per-category datasets, each rendered as an
    /// array of flat records over its header.
    pub fn from_datasets<I>(datasets: I) -> Self
    where
        I: IntoIterator<Item = (String, Dataset)>,
    {
        let mut data = Self::new();
        for (category, dataset) in datasets {
            data.insert_dataset(category, &dataset);
        }
        data
    }

    /// Store a dataset under `category` as an array of flat records.
    pub fn insert_dataset(&mut self, category: impl Into<String>, dataset: &Dataset) {
        let records = dataset
            .to_json_records()
            .into_iter()
            .map(Value::Object)
            .collect();
        self.insert(category, Value::Array(records));
    }

    /// The value of one category.
    pub fn get(&self, category: &str) -> Option<&Value> {
        self.categories.get(category)
    }

    /// The records of a category, if it holds an array.
    pub fn records(&self, category: &str) -> Option<&[Value]> {
        self.get(category).and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Set a category, returning the previous value. `created_at` cannot be
    /// set this way; it is ignored.
    pub fn insert(&mut self, category: impl Into<String>, value: Value) -> Option<Value> {
        let category = category.into();
        if category == CREATED_AT {
            tracing::warn!("ignoring attempt to set {CREATED_AT} as a category");
            return None;
        }
        self.categories.insert(category, value)
    }

    /// Category names in key order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Every `(category, value)` pair in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the document has no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// `created_at` as a timestamp.
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        self.created_at.and_then(DateTime::from_timestamp_millis)
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
