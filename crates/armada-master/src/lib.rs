//! The Armada master-data document.
//!
//! The client consumes one JSON document holding every catalog category.
//! This crate owns its shape ([`MasterData`]), the rules for folding freshly
//! imported categories into it ([`merge()`]), and its file-backed
//! persistence ([`MasterDataStore`]).
//!
//! ```
//! use armada_master::{MasterData, MergeKeys, merge};
//! use serde_json::json;
//!
//! let canonical = MasterData::from_value(json!({ "gears": [{ "gear_id": 1, "name": "A" }] }))
//!     .unwrap_or_default();
//! let partial = MasterData::from_value(json!({ "gears": [{ "gear_id": 2, "name": "B" }] }))
//!     .unwrap_or_default();
//! let merged = merge(&canonical, &partial, &MergeKeys::default());
//! assert_eq!(merged.records("gears").map(<[_]>::len), Some(2));
//! ```

pub mod document;
pub mod error;
pub mod merge;
pub mod store;

pub use document::MasterData;
pub use error::MasterError;
pub use merge::{MergeKeys, MergeSummary, merge, merge_records, merge_with_summary};
pub use store::MasterDataStore;
