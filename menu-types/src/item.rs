//! A single menu entry.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One dish or drink.
///
/// Price fields are open-ended: empanadas and drinks carry a single
/// `precio`, completos carry one price per filling (`salchicha`, `mechada`,
/// `champinon`) and sandwiches one per meat (`churrasco`, `mechada`).
/// Every field that is not a name, description or visibility flag is kept
/// in [`MenuItem::prices`] in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Display name
    pub nombre: String,

    /// Ingredient description
    #[serde(default)]
    pub ingredientes: String,

    /// Hidden items stay in the tree but are not shown on the public menu.
    /// Anything other than an explicit `false` counts as visible.
    #[serde(default = "default_visible", deserialize_with = "visible_flag")]
    pub visible: bool,

    /// Named prices (`precio`, `salchicha`, ...)
    #[serde(flatten)]
    pub prices: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

fn visible_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(!matches!(value, Some(Value::Bool(false))))
}

impl MenuItem {
    /// Create a visible item with no prices
    pub fn new(nombre: impl Into<String>, ingredientes: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            ingredientes: ingredientes.into(),
            visible: true,
            prices: Map::new(),
        }
    }

    /// Builder-style helper to add a price field
    pub fn with_price(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prices.insert(key.into(), value.into());
        self
    }

    /// Price field rendered as text, `None` when absent or not a scalar.
    pub fn price_label(&self, key: &str) -> Option<String> {
        match self.prices.get(key)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Names of the price fields in stored order
    pub fn price_keys(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_defaults_to_true() {
        let item: MenuItem =
            serde_json::from_str(r#"{"nombre":"Pino","ingredientes":"Carne","precio":2500}"#)
                .unwrap();
        assert!(item.visible);
        assert_eq!(item.price_label("precio"), Some("2500".to_string()));
    }

    #[test]
    fn test_only_explicit_false_hides() {
        let hidden: MenuItem =
            serde_json::from_str(r#"{"nombre":"X","visible":false}"#).unwrap();
        assert!(!hidden.visible);

        let null: MenuItem = serde_json::from_str(r#"{"nombre":"X","visible":null}"#).unwrap();
        assert!(null.visible);

        let odd: MenuItem = serde_json::from_str(r#"{"nombre":"X","visible":"no"}"#).unwrap();
        assert!(odd.visible);
    }

    #[test]
    fn test_price_fields_keep_order() {
        let item: MenuItem = serde_json::from_str(
            r#"{"nombre":"Italiano","ingredientes":"Tomate, palta, mayo","salchicha":2800,"mechada":3800,"champinon":3500}"#,
        )
        .unwrap();
        let keys: Vec<&str> = item.price_keys().collect();
        assert_eq!(keys, vec!["salchicha", "mechada", "champinon"]);
    }

    #[test]
    fn test_serialized_item_always_carries_visible() {
        let item = MenuItem::new("Bebida", "Lata 350cc").with_price("precio", 1200);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["visible"], Value::Bool(true));
        assert_eq!(value["precio"], Value::from(1200));
    }
}
