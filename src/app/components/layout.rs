//! Layout component wrapping all pages with Pico CSS and common elements.

use dioxus::prelude::*;

use super::nav::Nav;

/// CSS styles for the application (extends Pico CSS).
const CUSTOM_STYLES: &str = r#"
:root { --pico-font-size: 15px; }
.muted { color: var(--pico-muted-color); }
.notice { padding: 0.75rem 1rem; border-left: 4px solid var(--pico-primary); }
.notice.error { border-left-color: var(--pico-del-color); }
.menu-list { list-style: none; padding: 0; }
.menu-item { display: grid; grid-template-columns: 1.5fr repeat(3, 1fr); align-items: center; gap: 0.5rem; padding: 0.5rem 0; border-bottom: 1px solid var(--pico-muted-border-color); }
.menu-item .item-name { display: flex; flex-direction: column; }
.menu-item .price { font-weight: bold; text-align: center; }
.item-form { display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 0.5rem; align-items: end; }
.item-form button, .item-form label { margin: 0; }
textarea.json { font-family: monospace; min-height: 16rem; }
small { color: var(--pico-muted-color); }
"#;

#[derive(Props, Clone, PartialEq)]
pub struct LayoutProps {
    /// Page title (shown in browser tab)
    pub title: String,
    /// Active navigation item ID
    pub nav_active: String,
    /// Page content
    pub children: Element,
    /// Inline script appended to the body
    #[props(default)]
    pub script: Option<&'static str>,
}

/// Main layout component wrapping all pages. Renders `head` and `body`;
/// [`render_page`](crate::app::render_page) adds the document root.
#[component]
pub fn Layout(props: LayoutProps) -> Element {
    let version = env!("CARGO_PKG_VERSION");
    let full_title = format!("{} - Carro de Completos", props.title);

    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{full_title}" }
            link { rel: "stylesheet", href: "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css" }
            style { dangerous_inner_html: CUSTOM_STYLES }
        }
        body {
            header { class: "container",
                Nav { active: props.nav_active.clone() }
            }
            main { class: "container",
                {props.children}
            }
            footer { class: "container",
                small { "Carro de Completos v{version}" }
            }
            if let Some(script) = props.script {
                script { dangerous_inner_html: script }
            }
        }
    }
}
