//! Static carta page built by the static loader.

use dioxus::prelude::*;

use crate::app::components::Layout;
use crate::loader::{Containers, CONTAINERS};

#[component]
pub fn CartaPage(containers: Containers) -> Element {
    let lists = CONTAINERS.map(|(id, category)| {
        (id, category.title(), containers.get(id).unwrap_or_default().to_string())
    });

    rsx! {
        Layout {
            title: "Carta".to_string(),
            nav_active: "carta".to_string(),

            h1 { "Carta" }
            if containers.is_empty() {
                p { class: "muted", "La carta no está disponible." }
            }
            for (id, title, markup) in lists {
                section { key: "{id}",
                    h2 { "{title}" }
                    ul { id: "{id}", class: "menu-list", dangerous_inner_html: markup }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render_page;

    #[test]
    fn test_container_markup_is_inserted() {
        let mut containers = Containers::default();
        containers.set("menu-empanadas", "<li>Pino</li>".to_string());

        let html = render_page(rsx! { CartaPage { containers } });
        assert!(html.contains("<li>Pino</li>"));
        assert!(html.contains("id=\"menu-completos\""));
    }
}
