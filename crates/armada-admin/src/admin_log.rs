//! Activity log rows in the admin worksheet.
//!
//! Each line is `[timestamp, message]`, with the timestamp rendered in
//! Tokyo local time the way the spreadsheet's editors read it.

use armada_sync::SheetSyncClient;
use armada_types::CellValue;
use chrono::{DateTime, FixedOffset, Utc};

use crate::error::AdminError;

/// UTC offset of Asia/Tokyo. Japan observes no daylight saving time.
const TOKYO_OFFSET_SECS: i32 = 32_400;

/// Appends log lines to one worksheet.
#[derive(Debug)]
pub struct AdminLog<'a> {
    client: &'a SheetSyncClient,
    sheet: &'a str,
}

impl<'a> AdminLog<'a> {
    /// Log to `sheet` through `client`.
    pub const fn new(client: &'a SheetSyncClient, sheet: &'a str) -> Self {
        Self { client, sheet }
    }

    /// Append `[now, message]`.
    ///
    /// # Errors
    ///
    /// Propagates sheet store failures.
    pub async fn log(&self, message: &str) -> Result<(), AdminError> {
        self.log_at(Utc::now(), message).await
    }

    /// Append `[at, message]`.
    ///
    /// # Errors
    ///
    /// Propagates sheet store failures.
    pub async fn log_at(&self, at: DateTime<Utc>, message: &str) -> Result<(), AdminError> {
        let row = [CellValue::from(tokyo_timestamp(at)), CellValue::from(message)];
        self.client.append_row(self.sheet, &row).await?;
        tracing::info!(sheet = self.sheet, message, "admin log");
        Ok(())
    }
}

/// `YYYY/M/D H:MM:SS` in Tokyo time.
pub fn tokyo_timestamp(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%Y/%-m/%-d %-H:%M:%S";
    match FixedOffset::east_opt(TOKYO_OFFSET_SECS) {
        Some(tokyo) => at.with_timezone(&tokyo).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}
