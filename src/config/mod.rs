//! Configuration management

pub mod store;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

pub use store::{BackendConfig, ConfigError, ConfigStore};

/// Environment variable that overrides the config directory
const CONFIG_DIR_ENV: &str = "MENU_CONFIG_DIR";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory whose `*.json` files take precedence over the bundled menu
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Default backend connection, used until one is saved from the admin page
    #[serde(default)]
    pub backend: Option<BackendConfig>,

    /// Credentials accepted by the in-process (`memory://`) backend
    #[serde(default)]
    pub admin: Option<LocalAdmin>,
}

fn default_port() -> u16 {
    3000
}

#[derive(Clone, Deserialize)]
pub struct LocalAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LocalAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-user directory holding `config.*`, `backend.json` and `session.json`.
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    directories::ProjectDirs::from("cl", "carro-completos", "menu-stand")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let config = ::config::Config::builder()
        // Start with defaults
        .set_default("port", 3000)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy())
                .required(false),
        )
        // Override with environment variables (MENU_PORT, MENU_BACKEND__DATABASE_URL, etc.)
        .add_source(
            ::config::Environment::with_prefix("MENU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
