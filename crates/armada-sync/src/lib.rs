//! Spreadsheet synchronization for the Armada master data.
//!
//! The master data is authored in a Google spreadsheet, one worksheet per
//! category. This crate reads worksheets as [`Dataset`](armada_types::Dataset)s,
//! computes the minimal cell-level [`Operation`]s that bring a worksheet in
//! line with freshly computed records, and applies them as a single batch.
//!
//! # Architecture
//!
//! - [`diff`] -- Identity-matched row diffing ([`RowDiffer`], [`diff()`]).
//! - [`request`] -- Typed `batchUpdate` envelope shared by all backends.
//! - [`backend`] -- Enum-dispatched [`SheetBackend`]: Google or in-memory.
//! - [`auth`] -- Lazily fetched, single-flight access token.
//! - [`client`] -- [`SheetSyncClient`]: read, apply, append, sync.
//! - [`sheets`] -- Category → worksheet title registry.
//! - [`config`] -- Environment-driven [`SheetsConfig`].
//!
//! # Policy
//!
//! Syncing never deletes: rows present only in the worksheet are left as
//! they are. Nothing retries; a failed batch is assumed not applied.

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod request;
pub mod sheets;

pub use auth::{AuthHandle, TokenSource};
pub use backend::{GoogleSheets, MemorySheets, SheetBackend, SheetProperties};
pub use client::SheetSyncClient;
pub use config::SheetsConfig;
pub use diff::{Operation, RowDiffer, diff};
pub use error::SyncError;
pub use request::BatchUpdateRequest;
pub use sheets::{ADMIN_LOG_SHEET, SheetRegistry};
