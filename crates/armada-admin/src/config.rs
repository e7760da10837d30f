//! Configuration for the admin binary.
//!
//! Connection settings and paths come from environment variables. What to
//! import, and how to merge it, optionally comes from a YAML file named by
//! `ARMADA_CONFIG`:
//!
//! ```yaml
//! sheets: [ships, gears, ship_attrs, gear_attrs]
//! sheet_titles:
//!   ships: 艦娘
//! merge_keys:
//!   formation: [id]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use armada_master::MergeKeys;
use armada_sync::{ADMIN_LOG_SHEET, SheetRegistry, SheetsConfig};
use serde::Deserialize;

use crate::error::AdminError;

/// Default location of the master-data document.
pub const DEFAULT_MASTER_DATA_PATH: &str = "master_data.json";

/// Complete admin configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminConfig {
    /// How to reach the spreadsheet.
    pub sheets: SheetsConfig,
    /// Where the master-data document lives.
    pub master_data_path: PathBuf,
    /// Worksheet receiving start/success log lines.
    pub admin_log_sheet: String,
    /// Import and merge settings.
    pub import: ImportConfig,
}

/// What `update-data` reads and how it merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportConfig {
    /// Categories to import. Empty means every registered category.
    #[serde(default)]
    pub sheets: Vec<String>,

    /// Worksheet title overrides, by category.
    #[serde(default)]
    pub sheet_titles: BTreeMap<String, String>,

    /// Merge key overrides, by category. An empty list merges the category
    /// wholesale.
    #[serde(default)]
    pub merge_keys: BTreeMap<String, Vec<String>>,
}

impl ImportConfig {
    /// Parse import settings from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Yaml`] if the string is not valid YAML of this
    /// shape.
    pub fn parse(yaml: &str) -> Result<Self, AdminError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Read import settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Io`] if the file cannot be read, or
    /// [`AdminError::Yaml`] if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, AdminError> {
        let contents = std::fs::read_to_string(path).map_err(|source| AdminError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// The sheet registry with title overrides applied.
    pub fn registry(&self) -> SheetRegistry {
        SheetRegistry::default().with_overrides(&self.sheet_titles)
    }

    /// Merge keys with overrides applied.
    pub fn merge_keys(&self) -> MergeKeys {
        MergeKeys::default().with_overrides(&self.merge_keys)
    }

    /// Categories to import, resolved against `registry`.
    pub fn categories(&self, registry: &SheetRegistry) -> Vec<String> {
        if self.sheets.is_empty() {
            registry.iter().map(|(key, _)| key.to_owned()).collect()
        } else {
            self.sheets.clone()
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SPREADSHEET_ID` -- spreadsheet holding the master data
    ///
    /// Optional variables:
    /// - `SHEETS_API_URL`, `SHEETS_ACCESS_TOKEN`, `GCE_METADATA_URL` -- see
    ///   [`SheetsConfig::from_env`]
    /// - `MASTER_DATA_PATH` -- master-data document (default `master_data.json`)
    /// - `ADMIN_LOG_SHEET` -- log worksheet (default `管理`)
    /// - `ARMADA_CONFIG` -- YAML import settings
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] if a required variable is missing, and
    /// propagates failures reading `ARMADA_CONFIG`.
    pub fn from_env() -> Result<Self, AdminError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdminError> {
        let sheets = SheetsConfig::from_lookup(&lookup).map_err(|e| AdminError::Config {
            message: e.to_string(),
        })?;
        let master_data_path = lookup("MASTER_DATA_PATH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MASTER_DATA_PATH.to_owned())
            .into();
        let admin_log_sheet = lookup("ADMIN_LOG_SHEET")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| ADMIN_LOG_SHEET.to_owned());
        let import = match lookup("ARMADA_CONFIG").filter(|v| !v.is_empty()) {
            Some(path) => ImportConfig::from_file(Path::new(&path))?,
            None => ImportConfig::default(),
        };

        Ok(Self {
            sheets,
            master_data_path,
            admin_log_sheet,
            import,
        })
    }
}
