//! Server-rendered web UI.
//!
//! Pages are Dioxus components rendered to HTML on every request; the only
//! client-side script is the live reload on the menu page.

use dioxus::prelude::*;

pub mod components;
pub mod pages;

/// Render a page component to a full HTML document.
pub fn render_page(page: Element) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"es\">{}</html>",
        dioxus_ssr::render_element(page)
    )
}
