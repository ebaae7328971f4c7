//! Static carta loader.
//!
//! Loads the completos, empanadas and bebestibles files concurrently and
//! renders each into its named container. Nothing is written unless all
//! three load.

use dioxus::prelude::*;
use menu_types::{Category, MenuItem};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::app::components::ComboRow;
use crate::menu::{MenuSource, SourceError};

/// Container IDs and the category rendered into each
pub const CONTAINERS: [(&str, Category); 3] = [
    ("menu-completos", Category::Completos),
    ("menu-empanadas", Category::Empanadas),
    ("menu-bebestibles", Category::Bebestibles),
];

/// Rendered markup by container ID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Containers {
    markup: BTreeMap<String, String>,
}

impl Containers {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.markup.get(id).map(String::as_str)
    }

    pub fn set(&mut self, id: &str, markup: String) {
        self.markup.insert(id.to_string(), markup);
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }
}

pub struct StaticLoader {
    source: Arc<dyn MenuSource>,
}

impl StaticLoader {
    pub fn new(source: Arc<dyn MenuSource>) -> Self {
        Self { source }
    }

    /// Render the three categories into `containers`. On any failure the
    /// error is logged and `containers` is left as it was.
    pub async fn load_into(&self, containers: &mut Containers) {
        match self.render().await {
            Ok(rendered) => {
                for (id, markup) in rendered {
                    containers.set(id, markup);
                }
                info!("Static carta loaded");
            }
            Err(e) => error!("Failed to load static carta: {}", e),
        }
    }

    async fn render(&self) -> Result<[(&'static str, String); 3], SourceError> {
        let (completos, empanadas, bebestibles) = futures::try_join!(
            self.source.load(Category::Completos),
            self.source.load(Category::Empanadas),
            self.source.load(Category::Bebestibles),
        )?;

        Ok([
            (CONTAINERS[0].0, render_rows(Category::Completos, completos)),
            (CONTAINERS[1].0, render_rows(Category::Empanadas, empanadas)),
            (CONTAINERS[2].0, render_rows(Category::Bebestibles, bebestibles)),
        ])
    }
}

/// Price fields shown per row on the carta
fn price_keys(category: Category) -> Vec<&'static str> {
    match category {
        Category::Completos => vec!["salchicha", "mechada", "champinon"],
        _ => vec!["precio"],
    }
}

fn render_rows(category: Category, items: Vec<MenuItem>) -> String {
    let keys = price_keys(category);
    dioxus_ssr::render_element(rsx! {
        for item in items {
            ComboRow { item, keys: keys.clone() }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::BundledMenu;
    use async_trait::async_trait;

    /// Fails a single file
    struct Broken(&'static str);

    #[async_trait]
    impl MenuSource for Broken {
        async fn read(&self, file: &str) -> Result<Vec<u8>, SourceError> {
            if file == self.0 {
                return Ok(b"{ truncated".to_vec());
            }
            BundledMenu::default().read(file).await
        }
    }

    #[tokio::test]
    async fn test_load_fills_three_containers() {
        let loader = StaticLoader::new(Arc::new(BundledMenu::default()));
        let mut containers = Containers::default();
        loader.load_into(&mut containers).await;

        let completos = containers.get("menu-completos").unwrap();
        assert!(completos.contains("Italiano"));
        assert!(completos.contains("$2800"));
        assert!(completos.contains("$3800"));
        assert!(containers.get("menu-empanadas").unwrap().contains("Pino"));
        assert!(containers.get("menu-bebestibles").is_some());
        assert!(containers.get("menu-sandwich").is_none());
    }

    #[tokio::test]
    async fn test_any_failure_leaves_containers_untouched() {
        let mut containers = Containers::default();
        containers.set("menu-completos", "previous".to_string());
        let before = containers.clone();

        let loader = StaticLoader::new(Arc::new(Broken("bebestibles.json")));
        loader.load_into(&mut containers).await;
        assert_eq!(containers, before);
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let loader = StaticLoader::new(Arc::new(BundledMenu::default()));
        let mut first = Containers::default();
        loader.load_into(&mut first).await;
        let mut second = first.clone();
        loader.load_into(&mut second).await;
        assert_eq!(first, second);
    }
}
