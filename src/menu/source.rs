//! Bundled menu files.
//!
//! `data_menu/*.json` is compiled into the binary. When a data directory is
//! configured, files found there take precedence over the embedded copies.

use async_trait::async_trait;
use menu_types::tree::decode_items;
use menu_types::{Category, MenuItem};
use rust_embed::RustEmbed;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(RustEmbed)]
#[folder = "data_menu/"]
struct MenuFiles;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("menu file not found: {0}")]
    NotFound(String),
    #[error("failed to read menu file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse menu file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid menu file {file}: {reason}")]
    Invalid { file: String, reason: String },
}

/// Where bundled category files come from.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Raw bytes of a file under `data_menu/`
    async fn read(&self, file: &str) -> Result<Vec<u8>, SourceError>;

    /// Items of one category, taken from the array under the category name.
    /// A file without that array yields no items.
    async fn load(&self, category: Category) -> Result<Vec<MenuItem>, SourceError> {
        let file = category.file_name();
        let bytes = self.read(file).await?;
        let mut wrapper: Value = serde_json::from_slice(&bytes)?;

        match wrapper.get_mut(category.as_str()).map(Value::take) {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(items) => {
                let invalid = |reason: String| SourceError::Invalid {
                    file: file.to_string(),
                    reason,
                };
                let decoded = decode_items(items).map_err(invalid)?;
                match decoded.rejected.into_iter().next() {
                    Some((index, reason)) => Err(invalid(format!("item {}: {}", index, reason))),
                    None => Ok(decoded.items),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundledMenu {
    override_dir: Option<PathBuf>,
}

impl BundledMenu {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }
}

/// Plain `name.json` only; no directories.
fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && !file.contains(['/', '\\'])
        && file.ends_with(".json")
}

#[async_trait]
impl MenuSource for BundledMenu {
    async fn read(&self, file: &str) -> Result<Vec<u8>, SourceError> {
        if !is_plain_file_name(file) {
            return Err(SourceError::NotFound(file.to_string()));
        }

        if let Some(dir) = &self.override_dir {
            match tokio::fs::read(dir.join(file)).await {
                Ok(bytes) => {
                    debug!("Menu file {} read from {}", file, dir.display());
                    return Ok(bytes);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        MenuFiles::get(file)
            .map(|embedded| embedded.data.into_owned())
            .ok_or_else(|| SourceError::NotFound(file.to_string()))
    }
}
