//! Backend connection settings persisted on disk.
//!
//! A config saved from the admin page wins over the defaults supplied
//! through the environment. Saving never leaves a half-written file: the
//! JSON goes to a sibling temp file first and is renamed into place.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

const BACKEND_CONFIG_FILE: &str = "backend.json";

/// Connection parameters for the hosted realtime database.
///
/// Field names follow the JSON snippet the hosting console hands out
/// (`databaseURL`, `apiKey`, ...), so it can be pasted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "apiKey", alias = "api_key", default)]
    pub api_key: String,
    #[serde(rename = "authDomain", alias = "auth_domain", default)]
    pub auth_domain: String,
    #[serde(rename = "databaseURL", alias = "database_url", default)]
    pub database_url: String,
    #[serde(rename = "projectId", alias = "project_id", default)]
    pub project_id: String,
    #[serde(rename = "storageBucket", alias = "storage_bucket", default)]
    pub storage_bucket: String,
    #[serde(rename = "messagingSenderId", alias = "messaging_sender_id", default)]
    pub messaging_sender_id: String,
    #[serde(rename = "appId", alias = "app_id", default)]
    pub app_id: String,
    #[serde(rename = "measurementId", alias = "measurement_id", default)]
    pub measurement_id: String,
}

impl BackendConfig {
    /// The database root URL; `memory://` selects the in-process store.
    pub fn database_url(&self) -> Result<Url, ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("databaseURL is required".to_string()));
        }
        let url = Url::parse(self.database_url.trim())
            .map_err(|e| ConfigError::Invalid(format!("databaseURL: {}", e)))?;
        match url.scheme() {
            "http" | "https" | "memory" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "databaseURL: unsupported scheme '{}'",
                other
            ))),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.database_url()
            .map(|url| url.scheme() == "memory")
            .unwrap_or(false)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to persist configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted backend config with environment fallback
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    defaults: Option<BackendConfig>,
}

impl ConfigStore {
    pub fn new(config_dir: &Path, defaults: Option<BackendConfig>) -> Self {
        // Defaults without a usable database URL do not count as a config
        let defaults = defaults.filter(|config| match config.database_url() {
            Ok(_) => true,
            Err(e) => {
                warn!("Ignoring default backend config: {}", e);
                false
            }
        });
        Self {
            path: config_dir.join(BACKEND_CONFIG_FILE),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved config if present and valid, else the environment default.
    pub fn get_config(&self) -> Option<BackendConfig> {
        self.load_saved().or_else(|| self.defaults.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.get_config().is_some()
    }

    /// Parse and persist a config pasted from the admin page.
    ///
    /// Returns `false` (and keeps whatever was in effect before) when the
    /// text is not a valid config or cannot be written.
    pub fn configure(&self, text: &str) -> bool {
        match self.try_configure(text) {
            Ok(()) => {
                info!("Saved backend config to {}", self.path.display());
                true
            }
            Err(e) => {
                warn!("Rejected backend config: {}", e);
                false
            }
        }
    }

    fn try_configure(&self, text: &str) -> Result<(), ConfigError> {
        let config: BackendConfig = serde_json::from_str(text)?;
        config.database_url()?;
        self.persist(&config)
    }

    fn persist(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn load_saved(&self) -> Option<BackendConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read backend config: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<BackendConfig>(&content) {
            Ok(config) if config.database_url().is_ok() => Some(config),
            Ok(_) => {
                warn!("Saved backend config has no usable databaseURL, ignoring");
                None
            }
            Err(e) => {
                warn!("Failed to parse backend config: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "apiKey": "AIza-test",
        "authDomain": "carro.firebaseapp.com",
        "databaseURL": "https://carro-default-rtdb.firebaseio.com",
        "projectId": "carro"
    }"#;

    #[test]
    fn test_unconfigured_without_file_or_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path(), None);
        assert!(!store.is_configured());
        assert!(store.get_config().is_none());
    }

    #[test]
    fn test_defaults_make_store_configured() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = BackendConfig {
            database_url: "memory://local".to_string(),
            ..Default::default()
        };
        let store = ConfigStore::new(dir.path(), Some(defaults.clone()));
        assert!(store.is_configured());
        assert_eq!(store.get_config(), Some(defaults));
    }

    #[test]
    fn test_defaults_without_database_url_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = BackendConfig {
            api_key: "only-a-key".to_string(),
            ..Default::default()
        };
        let store = ConfigStore::new(dir.path(), Some(defaults));
        assert!(!store.is_configured());
    }

    #[test]
    fn test_configure_persists_and_wins_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = BackendConfig {
            database_url: "memory://local".to_string(),
            ..Default::default()
        };
        let store = ConfigStore::new(dir.path(), Some(defaults));

        assert!(store.configure(VALID));
        let config = store.get_config().unwrap();
        assert_eq!(config.api_key, "AIza-test");
        assert_eq!(config.project_id, "carro");
        assert!(store.path().exists());
    }

    #[test]
    fn test_malformed_text_is_rejected_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path(), None);

        assert!(!store.configure("{ not json"));
        assert!(!store.configure(r#"{"apiKey": "no-url"}"#));
        assert!(!store.configure(r#"{"databaseURL": "ftp://example.com"}"#));
        assert!(!store.path().exists());
        assert!(!store.is_configured());
    }

    #[test]
    fn test_rejected_text_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path(), None);
        assert!(store.configure(VALID));

        assert!(!store.configure("[]"));
        assert_eq!(store.get_config().unwrap().project_id, "carro");
    }

    #[test]
    fn test_corrupt_saved_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BACKEND_CONFIG_FILE), "garbage").unwrap();
        let defaults = BackendConfig {
            database_url: "memory://local".to_string(),
            ..Default::default()
        };
        let store = ConfigStore::new(dir.path(), Some(defaults.clone()));
        assert_eq!(store.get_config(), Some(defaults));
    }
}
