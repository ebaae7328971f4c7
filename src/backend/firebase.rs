//! Hosted realtime database over its REST API.
//!
//! - `GET   {db}/.json`  read the tree
//! - `PUT   {db}/.json`  replace the tree
//! - `PATCH {db}/.json`  multi-path update
//! - `GET   {db}/.json` with `Accept: text/event-stream` for live changes
//!
//! Requests carry `?auth=<id token>` while an admin is signed in; reads are
//! expected to be public.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use url::Url;

use super::sse::{MirroredRoot, SseDecoder, StreamEvent};
use super::{BackendError, RealtimeStore, RootStream};
use crate::auth::AuthClient;

/// Snapshots buffered between the stream reader and the listener
const STREAM_BUFFER: usize = 16;

pub struct FirebaseStore {
    http: Client,
    /// Client without a total timeout, for long-lived event streams
    stream_http: Client,
    base: Url,
    auth: Option<Arc<AuthClient>>,
}

impl FirebaseStore {
    pub fn new(database_url: Url, auth: Option<Arc<AuthClient>>) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let stream_http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let mut base = database_url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            stream_http,
            base,
            auth,
        })
    }

    async fn root_url(&self) -> Result<Url, BackendError> {
        let mut url = self
            .base
            .join(".json")
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

        if let Some(auth) = &self.auth {
            if let Some(token) = auth.id_token().await? {
                url.query_pairs_mut().append_pair("auth", &token);
            }
        }
        Ok(url)
    }
}

async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RealtimeStore for FirebaseStore {
    async fn read_root(&self) -> Result<Option<Value>, BackendError> {
        let url = self.root_url().await?;
        debug!("Database read {}", self.base);
        let response = check(self.http.get(url).send().await?).await?;
        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write_root(&self, value: Value) -> Result<(), BackendError> {
        let url = self.root_url().await?;
        debug!("Database write {}", self.base);
        check(self.http.put(url).json(&value).send().await?).await?;
        Ok(())
    }

    async fn update(&self, updates: Map<String, Value>) -> Result<(), BackendError> {
        let url = self.root_url().await?;
        debug!(paths = ?updates.keys().collect::<Vec<_>>(), "Database update");
        check(self.http.patch(url).json(&updates).send().await?).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<RootStream, BackendError> {
        let url = self.root_url().await?;
        let response = self
            .stream_http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check(response).await?;
        info!("Listening for menu changes on {}", self.base);

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut mirror = MirroredRoot::default();

            loop {
                let chunk = tokio::select! {
                    _ = tx.closed() => {
                        debug!("Database listener dropped, closing stream");
                        return;
                    }
                    chunk = body.next() => chunk,
                };

                let chunk = match chunk {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(e)) => {
                        warn!("Database stream error: {}", e);
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                    None => {
                        info!("Database stream ended");
                        return;
                    }
                };

                for frame in decoder.push(&chunk) {
                    let applied = StreamEvent::from_sse(&frame)
                        .and_then(|event| match event {
                            Some(event) => mirror.apply(event),
                            None => Ok(None),
                        });
                    match applied {
                        Ok(Some(snapshot)) => {
                            if tx.send(Ok(snapshot)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Database stream closed: {}", e);
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}
