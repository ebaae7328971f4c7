//! Admin page: per-item edit forms, the whole menu as JSON and the backend
//! connection settings.

use dioxus::prelude::*;
use menu_types::{Category, MenuItem, MenuTree};

use crate::app::components::Layout;

/// Prefix of price inputs in the item form (`price_precio`, ...)
pub const PRICE_FIELD_PREFIX: &str = "price_";

#[derive(Props, Clone, PartialEq)]
pub struct AdminProps {
    pub tree: MenuTree,
    /// Signed-in admin
    pub email: String,
    /// Pretty-printed backend config, empty when none is saved
    pub config_json: String,
    #[props(default)]
    pub notice: Option<String>,
    #[props(default)]
    pub error: Option<String>,
}

#[component]
pub fn AdminPage(props: AdminProps) -> Element {
    let menu_json = serde_json::to_string_pretty(&props.tree).unwrap_or_default();
    let sections = Category::ALL.map(|category| {
        let items: Vec<(usize, MenuItem)> = props
            .tree
            .items(category)
            .iter()
            .enumerate()
            .map(|(position, item)| (props.tree.item_key(category, position), item.clone()))
            .collect();
        (category, category.title(), items)
    });

    rsx! {
        Layout {
            title: "Administración".to_string(),
            nav_active: "admin".to_string(),

            hgroup {
                h1 { "Administración" }
                p { "Sesión iniciada como {props.email}" }
            }
            form { method: "post", action: "/logout",
                button { r#type: "submit", class: "secondary", "Cerrar sesión" }
            }
            if let Some(notice) = &props.notice {
                p { class: "notice", "{notice}" }
            }
            if let Some(error) = &props.error {
                p { class: "notice error", "{error}" }
            }

            for (category, title, items) in sections {
                section { key: "{category}",
                    h2 { "{title}" }
                    for (slot, item) in items {
                        ItemForm { key: "{slot}", category, slot, item }
                    }
                }
            }

            section {
                h2 { "Menú completo" }
                p { class: "muted", "Reemplaza todo el menú en la base de datos." }
                form { method: "post", action: "/admin/menu",
                    textarea { class: "json", name: "menu", "{menu_json}" }
                    button { r#type: "submit", "Guardar menú" }
                }
            }

            section {
                h2 { "Conexión" }
                form { method: "post", action: "/admin/config",
                    textarea { class: "json", name: "config", "{props.config_json}" }
                    button { r#type: "submit", class: "secondary", "Guardar configuración" }
                }
            }
        }
    }
}

/// Edit form for one item, posting to its backend key
#[component]
fn ItemForm(category: Category, slot: usize, item: MenuItem) -> Element {
    let action = format!("/admin/items/{}/{}", category.as_str(), slot);
    let prices: Vec<(String, String, String)> = item
        .price_keys()
        .map(|key| {
            (
                key.to_string(),
                format!("{}{}", PRICE_FIELD_PREFIX, key),
                item.price_label(key).unwrap_or_default(),
            )
        })
        .collect();

    rsx! {
        form { class: "item-form", method: "post", action: "{action}",
            label { "Nombre"
                input { name: "nombre", value: "{item.nombre}", required: true }
            }
            label { "Ingredientes"
                input { name: "ingredientes", value: "{item.ingredientes}" }
            }
            for (field, name, value) in prices {
                label { key: "{name}", "{field}"
                    input { name: "{name}", value: "{value}" }
                }
            }
            label {
                input { r#type: "checkbox", name: "visible", checked: item.visible }
                "Visible"
            }
            button { r#type: "submit", "Guardar" }
        }
    }
}
