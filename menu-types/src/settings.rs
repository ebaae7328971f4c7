//! Per-category display columns.
//!
//! Settings are purely presentational: they name which price fields are
//! shown as columns for a category and what header each column gets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::category::Category;

/// One price column: the item field it reads and its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySettings {
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// The `_settings` block: category name -> display settings.
pub type Settings = BTreeMap<String, CategorySettings>;

/// Column schema used when the tree has no `_settings` block.
///
/// Only completos and sandwich have explicit defaults; the other
/// categories render a single `precio` column.
pub fn default_settings() -> Settings {
    let mut settings = Settings::new();
    settings.insert(
        Category::Completos.as_str().to_string(),
        CategorySettings {
            columns: vec![
                Column::new("salchicha", "Salchicha"),
                Column::new("mechada", "Ass / Mechada"),
                Column::new("champinon", "Champiñon"),
            ],
        },
    );
    settings.insert(
        Category::Sandwich.as_str().to_string(),
        CategorySettings {
            columns: vec![
                Column::new("churrasco", "Churrasco"),
                Column::new("mechada", "Mechada"),
            ],
        },
    );
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_cover_completos_and_sandwich_only() {
        let settings = default_settings();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["completos"].columns.len(), 3);
        assert_eq!(settings["completos"].columns[1].label, "Ass / Mechada");
        assert_eq!(settings["sandwich"].columns[0].key, "churrasco");
        assert!(!settings.contains_key("empanadas"));
        assert!(!settings.contains_key("bebestibles"));
    }
}
