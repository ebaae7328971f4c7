//! Menu rendering blocks shared by the public pages.

use dioxus::prelude::*;
use menu_types::{Category, Column, MenuItem};

/// Price cell text: `$2800`, or `-` when the item has no such price.
pub fn price_text(item: &MenuItem, key: &str) -> String {
    match item.price_label(key) {
        Some(price) => format!("${}", price),
        None => "-".to_string(),
    }
}

/// One category as a price table.
#[component]
pub fn MenuSection(category: Category, items: Vec<MenuItem>, columns: Vec<Column>) -> Element {
    let id = format!("menu-{}", category.as_str());
    let title = category.title();

    rsx! {
        section { id: "{id}",
            h2 { "{title}" }
            if items.is_empty() {
                p { class: "muted", "Sin productos por ahora." }
            } else {
                table {
                    thead {
                        tr {
                            th { "Producto" }
                            for column in columns.iter() {
                                th { key: "{column.key}", "{column.label}" }
                            }
                        }
                    }
                    tbody {
                        for item in items.iter() {
                            PriceRow { item: item.clone(), columns: columns.clone() }
                        }
                    }
                }
            }
        }
    }
}

/// Table row: name, ingredients and one cell per column.
#[component]
pub fn PriceRow(item: MenuItem, columns: Vec<Column>) -> Element {
    rsx! {
        tr {
            td {
                strong { "{item.nombre}" }
                if !item.ingredientes.is_empty() {
                    br {}
                    small { "{item.ingredientes}" }
                }
            }
            for column in columns.iter() {
                td { key: "{column.key}", {price_text(&item, &column.key)} }
            }
        }
    }
}

/// List entry used by the static carta: name, ingredients, then one price
/// per key.
#[component]
pub fn ComboRow(item: MenuItem, keys: Vec<&'static str>) -> Element {
    rsx! {
        li { class: "menu-item",
            div { class: "item-name",
                strong { "{item.nombre}" }
                small { "{item.ingredientes}" }
            }
            for key in keys.iter() {
                div { key: "{key}", class: "price", {price_text(&item, key)} }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_text() {
        let item = MenuItem::new("Italiano", "")
            .with_price("salchicha", 2800)
            .with_price("nota", "consultar");
        assert_eq!(price_text(&item, "salchicha"), "$2800");
        assert_eq!(price_text(&item, "nota"), "$consultar");
        assert_eq!(price_text(&item, "mechada"), "-");
    }

    #[test]
    fn test_section_escapes_item_text() {
        let html = dioxus_ssr::render_element(rsx! {
            MenuSection {
                category: Category::Empanadas,
                items: vec![MenuItem::new("<b>Pino</b>", "").with_price("precio", 2500)],
                columns: vec![Column::new("precio", "Precio")],
            }
        });
        assert!(html.contains("menu-empanadas"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b") || html.contains("&#60;b"));
        assert!(html.contains("Pino"));
        assert!(html.contains("$2500"));
    }
}
