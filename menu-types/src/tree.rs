//! The full menu tree and snapshot decoding.
//!
//! Realtime databases do not store arrays faithfully: an empty array
//! disappears and an array with holes comes back as an object keyed by
//! index. [`MenuTree::from_snapshot`] accepts both shapes, remembers the
//! key each item was stored under and reports the entries it could not
//! decode instead of failing the whole snapshot.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::category::Category;
use crate::item::MenuItem;
use crate::settings::{default_settings, Column, Settings};

/// Key of the settings block inside the backend tree
pub const SETTINGS_KEY: &str = "_settings";

/// Category name -> items, plus the optional `_settings` block.
///
/// Categories are keyed by name rather than by [`Category`] so that keys
/// written by other clients survive a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuTree {
    #[serde(flatten)]
    pub categories: BTreeMap<String, Vec<MenuItem>>,

    #[serde(rename = "_settings", skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,

    /// Backend keys of categories whose items are not stored at `0..n`
    #[serde(skip)]
    pub item_keys: BTreeMap<String, Vec<usize>>,
}

/// A snapshot entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid menu entry '{}': {}", self.key, self.reason)
    }
}

impl MenuTree {
    /// Decode a raw backend value.
    ///
    /// `null` is an empty tree. Entries that fail to decode are left out of
    /// the tree and returned alongside it.
    pub fn from_snapshot(value: Value) -> (Self, Vec<RejectedEntry>) {
        let mut tree = MenuTree::default();
        let mut rejected = Vec::new();

        let entries = match value {
            Value::Null => return (tree, rejected),
            Value::Object(entries) => entries,
            other => {
                rejected.push(RejectedEntry {
                    key: "/".to_string(),
                    reason: format!("expected an object, found {}", kind(&other)),
                });
                return (tree, rejected);
            }
        };

        for (key, value) in entries {
            if value.is_null() {
                continue;
            }

            if key == SETTINGS_KEY {
                match serde_json::from_value::<Settings>(value) {
                    Ok(settings) => tree.settings = Some(settings),
                    Err(e) => rejected.push(RejectedEntry {
                        key,
                        reason: e.to_string(),
                    }),
                }
                continue;
            }

            match decode_items(value) {
                Ok(decoded) => {
                    for (index, reason) in decoded.rejected.iter() {
                        rejected.push(RejectedEntry {
                            key: format!("{}/{}", key, index),
                            reason: reason.clone(),
                        });
                    }
                    if !decoded.is_dense() {
                        tree.item_keys.insert(key.clone(), decoded.keys);
                    }
                    tree.categories.insert(key, decoded.items);
                }
                Err(reason) => rejected.push(RejectedEntry { key, reason }),
            }
        }

        (tree, rejected)
    }

    /// Items of a category, empty when the category is absent
    pub fn items(&self, category: Category) -> &[MenuItem] {
        self.categories
            .get(category.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when the category is absent or has no items
    pub fn is_missing(&self, category: Category) -> bool {
        self.items(category).is_empty()
    }

    /// Replace a category. The items are then addressed by position.
    pub fn set_items(&mut self, category: Category, items: Vec<MenuItem>) {
        self.item_keys.remove(category.as_str());
        self.categories.insert(category.as_str().to_string(), items);
    }

    /// Backend key of the item shown at `position` in a category.
    ///
    /// Same as the position unless the stored category has gaps or
    /// skipped entries.
    pub fn item_key(&self, category: Category, position: usize) -> usize {
        self.item_keys
            .get(category.as_str())
            .and_then(|keys| keys.get(position).copied())
            .unwrap_or(position)
    }

    /// Display columns for a category.
    ///
    /// Reads `_settings` (or the default schema when the tree has none);
    /// categories without columns get a single `precio` column.
    pub fn columns(&self, category: Category) -> Vec<Column> {
        let from_settings = match &self.settings {
            Some(settings) => settings.get(category.as_str()).map(|s| s.columns.clone()),
            None => default_settings()
                .remove(category.as_str())
                .map(|s| s.columns),
        };

        match from_settings {
            Some(columns) if !columns.is_empty() => columns,
            _ => vec![Column::new("precio", "Precio")],
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<'de> Deserialize<'de> for MenuTree {
    /// Strict decoding: any rejected entry fails the whole value.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let (tree, rejected) = MenuTree::from_snapshot(value);
        match rejected.first() {
            Some(entry) => Err(D::Error::custom(entry)),
            None => Ok(tree),
        }
    }
}

/// One decoded category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedItems {
    pub items: Vec<MenuItem>,
    /// Backend key of each entry in `items`
    pub keys: Vec<usize>,
    /// Keys whose value is not a menu item, with the reason
    pub rejected: Vec<(usize, String)>,
}

impl DecodedItems {
    /// True when every item sits at the key matching its position
    pub fn is_dense(&self) -> bool {
        self.keys.iter().enumerate().all(|(position, key)| position == *key)
    }
}

/// Decode one category value: an array or an object keyed by integer
/// index. Null slots are skipped; slots that do not decode are reported
/// and skipped, the remaining items keep their order.
pub fn decode_items(value: Value) -> Result<DecodedItems, String> {
    let slots: Vec<(usize, Value)> = match value {
        Value::Array(slots) => slots.into_iter().enumerate().collect(),
        Value::Object(entries) => {
            let mut indexed = Vec::with_capacity(entries.len());
            for (key, slot) in entries {
                let index = key
                    .parse::<usize>()
                    .map_err(|_| format!("expected an index key, found '{}'", key))?;
                indexed.push((index, slot));
            }
            indexed.sort_by_key(|(index, _)| *index);
            indexed
        }
        other => return Err(format!("expected a list of items, found {}", kind(&other))),
    };

    let mut decoded = DecodedItems::default();
    for (index, slot) in slots {
        if slot.is_null() {
            continue;
        }
        match serde_json::from_value::<MenuItem>(slot) {
            Ok(item) => {
                decoded.items.push(item);
                decoded.keys.push(index);
            }
            Err(e) => decoded.rejected.push((index, e.to_string())),
        }
    }
    Ok(decoded)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_with_empty_and_populated_categories() {
        let (tree, rejected) = MenuTree::from_snapshot(json!({
            "completos": [],
            "empanadas": [{"nombre": "X", "ingredientes": "Y", "precio": 100}]
        }));

        assert!(rejected.is_empty());
        assert!(tree.is_missing(Category::Completos));
        assert!(tree.is_missing(Category::Sandwich));
        let empanadas = tree.items(Category::Empanadas);
        assert_eq!(empanadas.len(), 1);
        assert_eq!(empanadas[0].nombre, "X");
        assert!(empanadas[0].visible);
        assert!(tree.settings.is_none());
    }

    #[test]
    fn test_index_keyed_object_is_read_in_index_order() {
        let (tree, rejected) = MenuTree::from_snapshot(json!({
            "bebestibles": {
                "10": {"nombre": "C", "precio": 3},
                "2": {"nombre": "B", "precio": 2},
                "0": {"nombre": "A", "precio": 1}
            }
        }));

        assert!(rejected.is_empty());
        let names: Vec<&str> = tree
            .items(Category::Bebestibles)
            .iter()
            .map(|i| i.nombre.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_null_slots_are_skipped() {
        let (tree, _) = MenuTree::from_snapshot(json!({
            "sandwich": [null, {"nombre": "Chacarero", "churrasco": 5900}]
        }));
        assert_eq!(tree.items(Category::Sandwich).len(), 1);
        assert_eq!(tree.item_key(Category::Sandwich, 0), 1);
    }

    #[test]
    fn test_gapped_category_keeps_backend_keys() {
        let (tree, rejected) = MenuTree::from_snapshot(json!({
            "empanadas": {"2": {"nombre": "Old", "precio": 1}},
            "bebestibles": [{"nombre": "Bilz", "precio": 1000}]
        }));

        assert!(rejected.is_empty());
        assert_eq!(tree.items(Category::Empanadas)[0].nombre, "Old");
        assert_eq!(tree.item_key(Category::Empanadas, 0), 2);
        assert_eq!(tree.item_key(Category::Bebestibles, 0), 0);
        assert!(!tree.item_keys.contains_key("bebestibles"));
    }

    #[test]
    fn test_set_items_resets_keys_to_positions() {
        let (mut tree, _) = MenuTree::from_snapshot(json!({
            "empanadas": {"3": {"nombre": "Pino", "precio": 2500}}
        }));
        tree.set_items(Category::Empanadas, vec![MenuItem::new("Queso", "")]);
        assert_eq!(tree.item_key(Category::Empanadas, 0), 0);
    }

    #[test]
    fn test_bad_item_is_skipped_and_others_kept() {
        let (tree, rejected) = MenuTree::from_snapshot(json!({
            "empanadas": [
                {"ingredientes": "sin nombre", "precio": 100},
                {"nombre": "Pino Casera", "precio": 2500},
                {"nombre": "Queso", "precio": 2000}
            ]
        }));

        let names: Vec<&str> = tree
            .items(Category::Empanadas)
            .iter()
            .map(|i| i.nombre.as_str())
            .collect();
        assert_eq!(names, vec!["Pino Casera", "Queso"]);
        assert_eq!(tree.item_key(Category::Empanadas, 0), 1);
        assert_eq!(tree.item_key(Category::Empanadas, 1), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].key, "empanadas/0");
    }

    #[test]
    fn test_undecodable_entries_are_reported_not_fatal() {
        let (tree, rejected) = MenuTree::from_snapshot(json!({
            "completos": "oops",
            "empanadas": [{"nombre": "Queso", "precio": 2000}],
            "_settings": 42
        }));

        assert_eq!(tree.items(Category::Empanadas).len(), 1);
        assert!(!tree.categories.contains_key("completos"));
        assert!(tree.settings.is_none());
        let keys: Vec<&str> = rejected.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["completos", "_settings"]);
    }

    #[test]
    fn test_unknown_categories_are_preserved() {
        let (tree, _) = MenuTree::from_snapshot(json!({
            "postres": [{"nombre": "Sopaipilla", "precio": 500}]
        }));
        assert_eq!(tree.categories["postres"].len(), 1);
    }

    #[test]
    fn test_strict_deserialize_rejects_bad_entries() {
        assert!(serde_json::from_value::<MenuTree>(json!({"completos": 1})).is_err());
        assert!(serde_json::from_value::<MenuTree>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<MenuTree>(json!({"completos": [{"precio": 1}]})).is_err());
        assert!(serde_json::from_value::<MenuTree>(json!(null)).is_ok());
    }

    #[test]
    fn test_columns_fall_back_to_precio() {
        let tree = MenuTree::default();
        assert_eq!(tree.columns(Category::Completos).len(), 3);
        assert_eq!(
            tree.columns(Category::Empanadas),
            vec![Column::new("precio", "Precio")]
        );
    }

    #[test]
    fn test_settings_serialized_under_reserved_key() {
        let mut tree = MenuTree::default();
        tree.set_items(Category::Empanadas, vec![MenuItem::new("Pino", "Carne")]);
        tree.settings = Some(default_settings());

        let value = tree.to_value().unwrap();
        assert!(value.get("_settings").is_some());
        assert_eq!(value["empanadas"][0]["nombre"], "Pino");

        let back: MenuTree = serde_json::from_value(value).unwrap();
        assert_eq!(back, tree);
    }
}
