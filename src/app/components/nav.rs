//! Navigation bar.

use dioxus::prelude::*;

/// Top navigation. `active` is the page ID ("menu", "carta", "admin").
#[component]
pub fn Nav(active: String) -> Element {
    let link_class = |page: &str| {
        if active == page {
            "contrast"
        } else {
            "secondary"
        }
    };

    rsx! {
        nav {
            ul {
                li {
                    a { href: "/", strong { "Carro de Completos" } }
                }
            }
            ul {
                li { a { class: link_class("menu"), href: "/", "Menú" } }
                li { a { class: link_class("carta"), href: "/carta", "Carta" } }
                li { a { class: link_class("admin"), href: "/admin", "Admin" } }
            }
        }
    }
}
