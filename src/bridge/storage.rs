//! Key/value access to settings that live in the host process

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::Result;

/// Prefix shared by every presence-related storage key
pub const PRESENCE_KEY_PREFIX: &str = "discordRPC/";

/// Master switch for presence, toggled from the host settings panel
pub const PRESENCE_ENABLED: Key<bool> = Key::new("discordRPC/enabled", true);
/// Keep showing the track while playback is paused
pub const SHOW_ON_PAUSE: Key<bool> = Key::new("discordRPC/showOnPause", false);
/// Attach an "open track" button to the presence card
pub const SHOW_BUTTON: Key<bool> = Key::new("discordRPC/showButton", true);

/// A typed storage key with the value used whenever the store cannot answer
#[derive(Debug, Clone, Copy)]
pub struct Key<T> {
    name: &'static str,
    default: T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str, default: T) -> Self {
        Self {
            name,
            default,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }
}

/// A value that changed in the store
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    /// `Value::Null` when the key was removed
    pub value: Value,
}

/// Raw, fallible access to a key/value store
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a key; `Ok(None)` when it is not set
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Write a key
    async fn store(&self, key: &str, value: Value) -> Result<()>;

    /// Stream of changes observed by this backend
    fn changes(&self) -> broadcast::Receiver<StorageChange>;
}

/// Handle to an active subscription; delivery stops when it is dropped
pub struct Subscription {
    _guard: DropGuard,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

/// Defaulting front-end over a [`StorageBackend`].
///
/// Reads never fail: an unavailable store or a value of the wrong type yields
/// the key's default. Writes are best-effort.
#[derive(Clone)]
pub struct StorageBridge {
    backend: Arc<dyn StorageBackend>,
}

impl StorageBridge {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub async fn get<T>(&self, key: &Key<T>) -> T
    where
        T: DeserializeOwned + Clone,
    {
        match self.backend.load(key.name()).await {
            Ok(Some(Value::Null)) | Ok(None) => key.default_value().clone(),
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("Ignoring malformed value for {}: {}", key.name(), e);
                    key.default_value().clone()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}, using default: {}", key.name(), e);
                key.default_value().clone()
            }
        }
    }

    /// Write a value, returning whether the store acknowledged it
    pub async fn set<T: Serialize>(&self, key: &Key<T>, value: T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to serialize value for {}: {}", key.name(), e);
                return false;
            }
        };

        match self.backend.store(key.name(), value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", key.name(), e);
                false
            }
        }
    }

    /// Call `handler` for every change whose key matches `predicate`
    pub fn subscribe<P, H>(&self, predicate: P, mut handler: H) -> Subscription
    where
        P: Fn(&str) -> bool + Send + 'static,
        H: FnMut(&StorageChange) + Send + 'static,
    {
        let mut changes = self.backend.changes();
        let cancel = CancellationToken::new();
        let stopped = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stopped.cancelled() => break,
                    received = changes.recv() => match received {
                        Ok(change) if predicate(&change.key) => handler(&change),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Storage subscriber lagged, skipped {} changes", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Subscription {
            _guard: cancel.drop_guard(),
        }
    }
}
