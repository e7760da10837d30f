//! Registry of master-data worksheets, keyed by category.
//!
//! Categories are the keys of the master-data document (`ships`, `gears`,
//! ...); worksheets are addressed by their Japanese titles in the source
//! spreadsheet.

use std::collections::BTreeMap;

use crate::error::SyncError;

/// Worksheet holding the admin activity log.
pub const ADMIN_LOG_SHEET: &str = "管理";

/// Built-in category → worksheet title map.
const BUILTIN: &[(&str, &str)] = &[
    ("ships", "艦娘"),
    ("ship_types", "艦種"),
    ("ship_classes", "艦級"),
    ("ship_attrs", "艦娘属性"),
    ("gears", "装備"),
    ("gear_types", "装備種"),
    ("gear_attrs", "装備属性"),
    // Improvement bonuses
    ("shelling_power", "改修砲撃攻撃力"),
    ("shelling_accuracy", "改修砲撃命中"),
    ("carrier_shelling_power", "改修空母砲撃攻撃力"),
    ("torpedo_power", "改修雷撃攻撃力"),
    ("torpedo_accuracy", "改修雷撃命中"),
    ("torpedo_evasion", "改修雷撃回避"),
    ("night_power", "改修夜戦攻撃力"),
    ("night_accuracy", "改修夜戦命中"),
    ("asw_power", "改修対潜攻撃力"),
    ("asw_accuracy", "改修対潜命中"),
    ("defense_power", "改修防御力"),
    ("contact_selection", "改修触接選択率"),
    ("fighter_power", "改修制空"),
    ("adjusted_anti_air", "改修加重対空"),
    ("fleet_anti_air", "改修艦隊対空"),
    ("elos", "改修マップ索敵"),
    // Configuration
    ("anti_air_cutin", "対空CI"),
    ("day_cutin", "昼戦CI"),
    ("night_cutin", "夜戦CI"),
    ("formation", "陣形"),
];

/// Maps master-data categories to worksheet titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRegistry {
    titles: BTreeMap<String, String>,
}

impl Default for SheetRegistry {
    fn default() -> Self {
        Self {
            titles: BUILTIN
                .iter()
                .map(|&(key, title)| (key.to_owned(), title.to_owned()))
                .collect(),
        }
    }
}

impl SheetRegistry {
    /// Add or replace entries.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (key, title) in overrides {
            self.titles.insert(key.clone(), title.clone());
        }
        self
    }

    /// Worksheet title for a category.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownSheet`] for an unregistered category.
    pub fn title(&self, key: &str) -> Result<&str, SyncError> {
        self.titles
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| SyncError::UnknownSheet(key.to_owned()))
    }

    /// Every `(category, title)` pair in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.titles.iter().map(|(k, t)| (k.as_str(), t.as_str()))
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether no category is registered.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_titles_resolve() {
        let registry = SheetRegistry::default();
        assert_eq!(registry.title("ships").ok(), Some("艦娘"));
        assert_eq!(registry.title("gears").ok(), Some("装備"));
        assert_eq!(registry.title("formation").ok(), Some("陣形"));
        assert_eq!(registry.len(), BUILTIN.len());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let registry = SheetRegistry::default();
        assert!(matches!(
            registry.title("nope"),
            Err(SyncError::UnknownSheet(key)) if key == "nope"
        ));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = BTreeMap::from([
            ("ships".to_owned(), "Ships".to_owned()),
            ("extra".to_owned(), "Extra".to_owned()),
        ]);
        let registry = SheetRegistry::default().with_overrides(&overrides);
        assert_eq!(registry.title("ships").ok(), Some("Ships"));
        assert_eq!(registry.title("extra").ok(), Some("Extra"));
    }
}
