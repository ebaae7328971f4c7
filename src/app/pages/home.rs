//! Public menu page.

use dioxus::prelude::*;
use menu_types::{Category, MenuTree};

use crate::app::components::{Layout, MenuSection};

/// Reloads the page on every menu change after the initial snapshot.
const LIVE_RELOAD_SCRIPT: &str = r#"
(function () {
  var initial = true;
  var source = new EventSource('/api/menu/events');
  source.addEventListener('menu', function () {
    if (initial) { initial = false; return; }
    window.location.reload();
  });
})();
"#;

/// Menu page: visible items of every category, columns from `_settings`.
#[component]
pub fn MenuPage(tree: MenuTree, live: bool) -> Element {
    let sections = Category::ALL.map(|category| {
        let items: Vec<_> = tree
            .items(category)
            .iter()
            .filter(|item| item.visible)
            .cloned()
            .collect();
        (category, items, tree.columns(category))
    });

    rsx! {
        Layout {
            title: "Menú".to_string(),
            nav_active: "menu".to_string(),
            script: live.then_some(LIVE_RELOAD_SCRIPT),

            h1 { "Menú" }
            if !live {
                p { class: "muted", "Mostrando el menú de base." }
            }
            for (category, items, columns) in sections {
                MenuSection { key: "{category}", category, items, columns }
            }
        }
    }
}
