//! Backend client lifecycle.
//!
//! [`Connection`] owns the one backend client of the process. The client is
//! built lazily from the config store on first use and cached; saving a new
//! config tears it down so the next access rebuilds it from the new
//! settings.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::{BackendClient, BackendError, FirebaseStore, MemoryStore};
use crate::auth::{AuthClient, FirebaseAuth, StaticAuth};
use crate::config::{BackendConfig, ConfigStore, LocalAdmin};

/// Builds a backend client for a config
pub type ClientFactory =
    Arc<dyn Fn(&BackendConfig) -> Result<BackendClient, BackendError> + Send + Sync>;

/// Inputs for [`connect`] that do not come from the backend config
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Where the signed-in admin session is kept across restarts
    pub session_path: PathBuf,
    /// Accepted credentials for `memory://` backends
    pub local_admin: Option<LocalAdmin>,
}

/// Build a client for a hosted database, or an in-process one for
/// `memory://` URLs.
pub fn connect(
    config: &BackendConfig,
    settings: &ClientSettings,
) -> Result<BackendClient, BackendError> {
    let url = config
        .database_url()
        .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

    if url.scheme() == "memory" {
        let users = settings
            .local_admin
            .iter()
            .map(|admin| (admin.email.clone(), admin.password.clone()));
        let auth = AuthClient::start(
            Arc::new(StaticAuth::new(users)),
            settings.session_path.clone(),
        );
        return Ok(BackendClient::new(Arc::new(MemoryStore::default()), auth));
    }

    let provider = FirebaseAuth::new(config.api_key.clone())?;
    let auth = AuthClient::start(Arc::new(provider), settings.session_path.clone());
    let store = FirebaseStore::new(url, Some(auth.clone()))?;
    Ok(BackendClient::new(Arc::new(store), auth))
}

pub struct Connection {
    config: ConfigStore,
    factory: ClientFactory,
    client: RwLock<Option<Arc<BackendClient>>>,
}

impl Connection {
    pub fn new(config: ConfigStore, settings: ClientSettings) -> Self {
        let factory: ClientFactory =
            Arc::new(move |backend: &BackendConfig| connect(backend, &settings));
        Self::with_factory(config, factory)
    }

    pub fn with_factory(config: ConfigStore, factory: ClientFactory) -> Self {
        Self {
            config,
            factory,
            client: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// The cached client, built on first use. `None` when unconfigured or
    /// when the client cannot be built from the current config.
    pub async fn client(&self) -> Option<Arc<BackendClient>> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Some(client.clone());
        }

        let mut slot = self.client.write().await;
        // Another caller may have built it while we waited for the lock
        if let Some(client) = slot.as_ref() {
            return Some(client.clone());
        }

        let config = self.config.get_config()?;
        match (self.factory)(&config) {
            Ok(client) => {
                info!("Backend client initialized for {}", config.database_url);
                let client = Arc::new(client);
                *slot = Some(client.clone());
                Some(client)
            }
            Err(e) => {
                error!("Failed to initialize backend client: {}", e);
                None
            }
        }
    }

    /// Auth handle of the current client
    pub async fn auth(&self) -> Option<Arc<AuthClient>> {
        self.client().await.map(|client| client.auth().clone())
    }

    /// Persist a new config and re-initialize. Returns `false` and changes
    /// nothing when the text is rejected.
    pub async fn configure(&self, text: &str) -> bool {
        if !self.config.configure(text) {
            return false;
        }
        self.reinitialize().await;
        true
    }

    /// Tear down the current client; live subscriptions on it end.
    pub async fn reinitialize(&self) {
        if let Some(old) = self.client.write().await.take() {
            old.shutdown();
            info!("Backend client torn down for re-initialization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(dir: PathBuf, built: Arc<AtomicUsize>) -> ClientFactory {
        Arc::new(move |_config: &BackendConfig| {
            built.fetch_add(1, Ordering::SeqCst);
            let auth = AuthClient::start(
                Arc::new(StaticAuth::new(Vec::new())),
                dir.join("session.json"),
            );
            Ok(BackendClient::new(Arc::new(MemoryStore::default()), auth))
        })
    }

    #[tokio::test]
    async fn test_unconfigured_has_no_client() {
        let dir = tempfile::tempdir().unwrap();
        let built = Arc::new(AtomicUsize::new(0));
        let connection = Connection::with_factory(
            ConfigStore::new(dir.path(), None),
            counting_factory(dir.path().to_path_buf(), built.clone()),
        );

        assert!(!connection.is_configured());
        assert!(connection.client().await.is_none());
        assert!(connection.auth().await.is_none());
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_is_built_once_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let built = Arc::new(AtomicUsize::new(0));
        let defaults = BackendConfig {
            database_url: "memory://local".to_string(),
            ..Default::default()
        };
        let connection = Connection::with_factory(
            ConfigStore::new(dir.path(), Some(defaults)),
            counting_factory(dir.path().to_path_buf(), built.clone()),
        );

        let first = connection.client().await.unwrap();
        let second = connection.client().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_configure_rebuilds_client() {
        let dir = tempfile::tempdir().unwrap();
        let built = Arc::new(AtomicUsize::new(0));
        let connection = Connection::with_factory(
            ConfigStore::new(dir.path(), None),
            counting_factory(dir.path().to_path_buf(), built.clone()),
        );
        assert!(connection.client().await.is_none());

        assert!(
            connection
                .configure(r#"{"databaseURL": "memory://first"}"#)
                .await
        );
        let first = connection.client().await.unwrap();
        let shutdown = first.shutdown_token();

        assert!(
            connection
                .configure(r#"{"databaseURL": "memory://second"}"#)
                .await
        );
        assert!(shutdown.is_cancelled());
        let second = connection.client().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_config_keeps_client() {
        let dir = tempfile::tempdir().unwrap();
        let built = Arc::new(AtomicUsize::new(0));
        let connection = Connection::with_factory(
            ConfigStore::new(dir.path(), None),
            counting_factory(dir.path().to_path_buf(), built.clone()),
        );
        assert!(
            connection
                .configure(r#"{"databaseURL": "memory://only"}"#)
                .await
        );
        let client = connection.client().await.unwrap();

        assert!(!connection.configure("not json").await);
        let same = connection.client().await.unwrap();
        assert!(Arc::ptr_eq(&client, &same));
        assert!(!client.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_connect_memory_backend_accepts_local_admin() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ClientSettings {
            session_path: dir.path().join("session.json"),
            local_admin: Some(LocalAdmin {
                email: "admin@carro.cl".to_string(),
                password: "completo123".to_string(),
            }),
        };
        let config = BackendConfig {
            database_url: "memory://local".to_string(),
            ..Default::default()
        };

        let client = connect(&config, &settings).unwrap();
        client.auth().settled().await;
        assert!(client
            .auth()
            .sign_in("admin@carro.cl", "completo123")
            .await
            .is_ok());
    }
}
