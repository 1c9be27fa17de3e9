//! HTTP bridge to the host application process
//!
//! The host exposes a small JSON API on localhost:
//!
//! - `GET /player` returns the current player state
//! - `GET /storage` returns every stored setting as one object
//! - `GET /storage/{key}` / `PUT /storage/{key}` read and write a single setting

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::storage::{StorageBackend, StorageChange};
use crate::error::{Error, Result};
use crate::player::HostPlayerState;

const CHANGE_CAPACITY: usize = 64;

pub struct HostBridge {
    client: reqwest::Client,
    base: Url,
    changes: broadcast::Sender<StorageChange>,
}

impl HostBridge {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Bridge URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Ok(Self {
            client,
            base,
            changes,
        })
    }

    /// Build an endpoint URL; each segment is percent-encoded, so keys such as
    /// `discordRPC/showButton` stay a single path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = self.client.get(url.clone()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::BridgeStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(Some(response.json().await?))
    }

    pub async fn player_state(&self) -> Result<HostPlayerState> {
        let state = self.get_json(self.endpoint(&["player"])).await?;
        Ok(state.unwrap_or_default())
    }

    pub async fn storage_snapshot(&self) -> Result<HashMap<String, Value>> {
        let values = self.get_json(self.endpoint(&["storage"])).await?;
        Ok(values.unwrap_or_default())
    }

    /// Poll the host's storage map and broadcast per-key differences until cancelled
    pub fn spawn_change_feed(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let bridge = Arc::clone(self);

        tokio::spawn(async move {
            let mut known: Option<HashMap<String, Value>> = None;

            loop {
                match bridge.storage_snapshot().await {
                    Ok(current) => {
                        if let Some(previous) = &known {
                            for change in diff_storage(previous, &current) {
                                let _ = bridge.changes.send(change);
                            }
                        }
                        known = Some(current);
                    }
                    Err(e) => tracing::debug!("Storage change feed poll failed: {}", e),
                }

                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = cancel.cancelled() => break,
                }
            }

            tracing::debug!("Storage change feed stopped");
        })
    }
}

fn diff_storage(
    previous: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<StorageChange> {
    let mut changes: Vec<StorageChange> = current
        .iter()
        .filter(|(key, value)| previous.get(*key) != Some(*value))
        .map(|(key, value)| StorageChange {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();

    changes.extend(
        previous
            .keys()
            .filter(|key| !current.contains_key(*key))
            .map(|key| StorageChange {
                key: key.clone(),
                value: Value::Null,
            }),
    );

    changes
}

#[async_trait]
impl StorageBackend for HostBridge {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        self.get_json(self.endpoint(&["storage", key])).await
    }

    async fn store(&self, key: &str, value: Value) -> Result<()> {
        let url = self.endpoint(&["storage", key]);
        let response = self.client.put(url.clone()).json(&value).send().await?;

        if !response.status().is_success() {
            return Err(Error::BridgeStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
