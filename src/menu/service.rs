//! Menu data service.
//!
//! Reads go to the backend when one is configured and fall back to the
//! bundled files otherwise; every tree handed out has passed through
//! [`MenuService::normalize`]. Writes require a configured backend.

use futures::{Stream, StreamExt};
use menu_types::{default_settings, Category, MenuItem, MenuTree};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::source::MenuSource;
use crate::backend::{BackendClient, BackendError, Connection};

/// Normalized snapshots buffered per subscriber
const SUBSCRIPTION_BUFFER: usize = 16;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("no backend is configured")]
    NotConfigured,
    #[error("backend is configured but could not be initialized")]
    Unavailable,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to encode menu: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct MenuService {
    connection: Arc<Connection>,
    source: Arc<dyn MenuSource>,
}

impl MenuService {
    pub fn new(connection: Arc<Connection>, source: Arc<dyn MenuSource>) -> Self {
        Self { connection, source }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    async fn client(&self) -> Result<Arc<BackendClient>, MenuError> {
        self.connection.client().await.ok_or(MenuError::Unavailable)
    }

    /// Read the whole tree once and normalize it.
    pub async fn fetch_menu(&self) -> Result<MenuTree, MenuError> {
        let raw = if self.connection.is_configured() {
            self.client().await?.store().read_root().await?
        } else {
            None
        };
        Ok(self.normalize(decode_snapshot(raw)).await)
    }

    /// Fill absent or empty categories from the bundled files and make sure
    /// `_settings` exists. Populated categories are left as they are.
    pub async fn normalize(&self, mut tree: MenuTree) -> MenuTree {
        for category in Category::ALL {
            if !tree.is_missing(category) {
                continue;
            }
            match self.source.load(category).await {
                Ok(items) => tree.set_items(category, items),
                Err(e) => {
                    warn!("Failed to load bundled {}: {}", category, e);
                    tree.categories
                        .entry(category.as_str().to_string())
                        .or_default();
                }
            }
        }

        if tree.settings.is_none() {
            tree.settings = Some(default_settings());
        }
        tree
    }

    /// Live menu. Without a backend the subscription yields one snapshot
    /// and ends; with one it yields a snapshot per backend change, starting
    /// with the current value. Dropping the subscription stops listening.
    pub async fn subscribe_to_menu(&self) -> Result<MenuSubscription, MenuError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let cancel = CancellationToken::new();

        if !self.connection.is_configured() {
            let tree = self.normalize(MenuTree::default()).await;
            // Fresh channel, cannot be full
            let _ = tx.try_send(tree);
            return Ok(MenuSubscription::new(rx, cancel));
        }

        let client = self.client().await?;
        let mut changes = client.store().subscribe().await?;
        let shutdown = client.shutdown_token();
        let stop = cancel.clone();
        let service = self.clone();

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = stop.cancelled() => {
                        debug!("Menu subscription dropped");
                        break;
                    }
                    _ = shutdown.cancelled() => {
                        info!("Backend re-initialized, ending menu subscription");
                        break;
                    }
                    next = changes.next() => next,
                };

                match next {
                    Some(Ok(raw)) => {
                        let tree = service.normalize(decode_snapshot(raw)).await;
                        if tx.send(tree).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Menu subscription ended: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        });

        Ok(MenuSubscription::new(rx, cancel))
    }

    /// Overwrite one item in place. Does nothing without a backend.
    ///
    /// `index` is the item's slot in the stored category, see
    /// [`MenuTree::item_key`].
    pub async fn update_item(
        &self,
        category: Category,
        index: usize,
        item: &MenuItem,
    ) -> Result<(), MenuError> {
        if !self.connection.is_configured() {
            debug!("No backend configured, ignoring update of {}/{}", category, index);
            return Ok(());
        }

        let client = self.client().await?;
        let mut updates = Map::new();
        updates.insert(
            format!("{}/{}", category.as_str(), index),
            serde_json::to_value(item)?,
        );
        client.store().update(updates).await?;
        info!("Updated {}/{}", category, index);
        Ok(())
    }

    /// Replace the whole backend tree.
    pub async fn save_menu(&self, tree: &MenuTree) -> Result<(), MenuError> {
        if !self.connection.is_configured() {
            return Err(MenuError::NotConfigured);
        }

        let client = self.client().await?;
        client.store().write_root(tree.to_value()?).await?;
        info!("Saved full menu ({} categories)", tree.categories.len());
        Ok(())
    }
}

/// Decode a backend root, dropping (and logging) entries that do not decode.
/// A category left without items is backfilled by normalization.
fn decode_snapshot(raw: Option<Value>) -> MenuTree {
    let (tree, rejected) = MenuTree::from_snapshot(raw.unwrap_or(Value::Null));
    for entry in rejected {
        warn!("Ignoring backend data: {}", entry);
    }
    tree
}

/// Stream of normalized menu snapshots.
pub struct MenuSubscription {
    rx: mpsc::Receiver<MenuTree>,
    _guard: DropGuard,
}

impl MenuSubscription {
    fn new(rx: mpsc::Receiver<MenuTree>, cancel: CancellationToken) -> Self {
        Self {
            rx,
            _guard: cancel.drop_guard(),
        }
    }

    /// Next snapshot, `None` once the subscription has ended
    pub async fn recv(&mut self) -> Option<MenuTree> {
        self.rx.recv().await
    }
}

impl Stream for MenuSubscription {
    type Item = MenuTree;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
