//! Owns the session with the presence service and keeps it alive

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::activity::ActivityPayload;
use super::transport::{PresenceConnection, PresenceTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Ready,
    /// Waiting out the retry delay after a failed or lost session
    ErrorBackoff,
}

struct Shared {
    transport: Arc<dyn PresenceTransport>,
    state: watch::Sender<SessionState>,
    connection: Mutex<Option<Arc<dyn PresenceConnection>>>,
    retry_delay: Duration,
    cancel: CancellationToken,
    supervisor: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Session lifecycle with a presence service.
///
/// A single supervisor task drives `Connecting -> Ready -> ErrorBackoff ->
/// Connecting ...` with a fixed retry delay. Cloning yields another handle to
/// the same session.
#[derive(Clone)]
pub struct PresenceSession {
    shared: Arc<Shared>,
}

impl PresenceSession {
    pub fn new(transport: Arc<dyn PresenceTransport>, retry_delay: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                transport,
                state,
                connection: Mutex::new(None),
                retry_delay,
                cancel: CancellationToken::new(),
                supervisor: std::sync::Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Start connecting. No-op unless the session is `Disconnected`, so at most
    /// one supervisor (and one connection attempt) exists at a time.
    pub fn connect(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }

        let started = self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected {
                *state = SessionState::Connecting;
                true
            } else {
                false
            }
        });
        if !started {
            return;
        }

        let handle = tokio::spawn(supervise(Arc::clone(&self.shared)));
        if let Ok(mut supervisor) = self.shared.supervisor.lock() {
            *supervisor = Some(handle);
        }
    }

    /// Show `payload`. Returns whether the service accepted it; dropped unless `Ready`.
    pub async fn publish(&self, payload: &ActivityPayload) -> bool {
        let Some(connection) = self.ready_connection().await else {
            return false;
        };

        match connection.set_activity(payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{} rejected activity update: {}", self.shared.transport.name(), e);
                false
            }
        }
    }

    /// Hide the activity. Returns whether the service accepted it; dropped unless `Ready`.
    pub async fn clear(&self) -> bool {
        let Some(connection) = self.ready_connection().await else {
            return false;
        };

        match connection.clear_activity().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{} rejected activity clear: {}", self.shared.transport.name(), e);
                false
            }
        }
    }

    async fn ready_connection(&self) -> Option<Arc<dyn PresenceConnection>> {
        if !self.is_ready() {
            return None;
        }
        self.shared.connection.lock().await.clone()
    }

    /// Stop the retry timer and close the session. Idempotent.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();

        let handle = self
            .shared
            .supervisor
            .lock()
            .ok()
            .and_then(|mut supervisor| supervisor.take());

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("Presence session supervisor ended abnormally: {}", e);
            }
        }
    }
}

async fn supervise(shared: Arc<Shared>) {
    let name = shared.transport.name();

    loop {
        tracing::info!("{} connecting...", name);

        let attempt = tokio::select! {
            attempt = shared.transport.connect() => attempt,
            _ = shared.cancel.cancelled() => break,
        };

        match attempt {
            Ok(connection) => {
                let connection: Arc<dyn PresenceConnection> = Arc::from(connection);
                *shared.connection.lock().await = Some(Arc::clone(&connection));
                shared.state.send_replace(SessionState::Ready);
                tracing::info!("{} session ready", name);

                let cancelled = tokio::select! {
                    _ = connection.closed() => false,
                    _ = shared.cancel.cancelled() => true,
                };

                shared.connection.lock().await.take();
                connection.disconnect().await;
                if cancelled {
                    break;
                }
                tracing::warn!("{} session lost", name);
            }
            Err(e) => tracing::warn!("{} connection failed: {}", name, e),
        }

        shared.state.send_replace(SessionState::ErrorBackoff);
        tracing::info!("Retrying {} in {:?}", name, shared.retry_delay);

        tokio::select! {
            _ = tokio::time::sleep(shared.retry_delay) => {}
            _ = shared.cancel.cancelled() => break,
        }

        shared.state.send_replace(SessionState::Connecting);
    }

    shared.state.send_replace(SessionState::Disconnected);
    tracing::info!("{} session stopped", name);
}
