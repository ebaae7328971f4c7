//! Realtime backend: the hosted menu database and its auth service.
//!
//! The menu service only ever needs four things from the database:
//! read the whole tree, overwrite the whole tree, patch single paths and
//! listen for changes. [`RealtimeStore`] is exactly that surface.

pub mod connection;
pub mod firebase;
pub mod memory;
pub mod sse;
pub mod tree;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthClient;

pub use connection::{ClientFactory, ClientSettings, Connection};
pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

/// Stream of full root values; `None` means the root does not exist.
pub type RootStream = BoxStream<'static, Result<Option<Value>, BackendError>>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid backend payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("live stream ended: {0}")]
    StreamClosed(String),
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// The four database operations the menu service uses.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Read the whole tree once.
    async fn read_root(&self) -> Result<Option<Value>, BackendError>;

    /// Replace the whole tree.
    async fn write_root(&self, value: Value) -> Result<(), BackendError>;

    /// Multi-path partial update; keys are slash-separated paths
    /// (`"empanadas/2"`).
    async fn update(&self, updates: Map<String, Value>) -> Result<(), BackendError>;

    /// Listen to the root. The first item is the current value, then one
    /// item per change, in backend order.
    async fn subscribe(&self) -> Result<RootStream, BackendError>;
}

/// A connected backend: the database plus the auth handle for it.
pub struct BackendClient {
    store: Arc<dyn RealtimeStore>,
    auth: Arc<AuthClient>,
    shutdown: CancellationToken,
}

impl BackendClient {
    pub fn new(store: Arc<dyn RealtimeStore>, auth: Arc<AuthClient>) -> Self {
        Self {
            store,
            auth,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RealtimeStore> {
        &self.store
    }

    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    /// Cancelled when the client is torn down by re-initialization.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
