//! In-process realtime store.
//!
//! Backs `memory://` configs (local development without a hosted database)
//! and the tests. Every write publishes the full root on a broadcast
//! channel, mirroring the hosted database's value listeners.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use super::tree::{merge_at, set_at};
use super::{BackendError, RealtimeStore, RootStream};

/// Change notifications buffered per listener before it lags
const CHANNEL_CAPACITY: usize = 64;

pub struct MemoryStore {
    root: RwLock<Value>,
    tx: broadcast::Sender<Option<Value>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl MemoryStore {
    pub fn new(initial: Value) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            root: RwLock::new(initial),
            tx,
        }
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Write a single path, the way another client editing the tree would.
    pub async fn set(&self, path: &str, value: Value) {
        let mut root = self.root.write().await;
        set_at(&mut root, path, value);
        self.publish(&root);
    }

    fn publish(&self, root: &Value) {
        // No listeners is fine
        let _ = self.tx.send(snapshot(root));
    }
}

fn snapshot(root: &Value) -> Option<Value> {
    if root.is_null() {
        None
    } else {
        Some(root.clone())
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn read_root(&self) -> Result<Option<Value>, BackendError> {
        Ok(snapshot(&*self.root.read().await))
    }

    async fn write_root(&self, value: Value) -> Result<(), BackendError> {
        let mut root = self.root.write().await;
        *root = value;
        self.publish(&root);
        Ok(())
    }

    async fn update(&self, updates: Map<String, Value>) -> Result<(), BackendError> {
        let mut root = self.root.write().await;
        merge_at(&mut root, "/", updates);
        self.publish(&root);
        Ok(())
    }

    async fn subscribe(&self) -> Result<RootStream, BackendError> {
        // Hold the read lock while subscribing so no write slips between
        // the initial value and the first notification
        let root = self.root.read().await;
        let rx = self.tx.subscribe();
        let initial = snapshot(&root);
        drop(root);

        // A lagging listener has missed changes, its stream ends with an error
        let changes = BroadcastStream::new(rx).map(|event| match event {
            Ok(value) => Ok(value),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!("Memory store listener fell {} changes behind", n);
                Err(BackendError::StreamClosed(format!(
                    "listener missed {} changes",
                    n
                )))
            }
        });

        Ok(futures::stream::once(async move { Ok(initial) })
            .chain(changes)
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_empty_root() {
        let store = MemoryStore::default();
        assert_eq!(store.read_root().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::default();
        store.write_root(json!({"empanadas": []})).await.unwrap();
        assert_eq!(
            store.read_root().await.unwrap(),
            Some(json!({"empanadas": []}))
        );
    }

    #[tokio::test]
    async fn test_update_addresses_single_item() {
        let store = MemoryStore::new(json!({
            "empanadas": [{"nombre": "Pino"}, {"nombre": "Queso"}]
        }));
        let mut updates = Map::new();
        updates.insert("empanadas/1".to_string(), json!({"nombre": "Napolitana"}));
        store.update(updates).await.unwrap();

        let root = store.read_root().await.unwrap().unwrap();
        assert_eq!(root["empanadas"][0]["nombre"], "Pino");
        assert_eq!(root["empanadas"][1]["nombre"], "Napolitana");
    }

    #[tokio::test]
    async fn test_subscribe_yields_current_value_then_changes() {
        let store = MemoryStore::new(json!({"a": 1}));
        let mut stream = store.subscribe().await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Some(json!({"a": 1})));

        store.set("b", json!(2)).await;
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second, Some(json!({"a": 1, "b": 2})));
    }

    #[tokio::test]
    async fn test_lagging_listener_gets_an_error() {
        let store = MemoryStore::default();
        let mut stream = store.subscribe().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        for i in 0..=CHANNEL_CAPACITY {
            store.set("n", json!(i)).await;
        }
        assert!(matches!(
            stream.next().await,
            Some(Err(BackendError::StreamClosed(_)))
        ));
    }

    #[tokio::test]
    async fn test_dropping_stream_removes_listener() {
        let store = MemoryStore::default();
        let stream = store.subscribe().await.unwrap();
        assert_eq!(store.listener_count(), 1);
        drop(stream);
        assert_eq!(store.listener_count(), 0);
    }
}
