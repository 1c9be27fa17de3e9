//! Wires the session, scheduler and settings watch together

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::{StorageBridge, Subscription, PRESENCE_KEY_PREFIX};
use crate::config::EngineConfig;
use crate::player::PlayerStateProvider;
use crate::presence::{
    ActivityComposer, PresenceSession, PresenceTransport, SchedulerConfig, UpdateScheduler,
};

/// A running presence engine
pub struct PresenceEngine {
    session: PresenceSession,
    scheduler: JoinHandle<()>,
    cancel: CancellationToken,
    settings_watch: Subscription,
}

impl PresenceEngine {
    /// Start the session and the update loop. Must be called inside a Tokio runtime.
    pub fn start(
        config: &EngineConfig,
        storage: StorageBridge,
        provider: Arc<dyn PlayerStateProvider>,
        transport: Arc<dyn PresenceTransport>,
    ) -> Self {
        let session = PresenceSession::new(transport, config.retry_delay());
        session.connect();

        let settings_watch = storage.subscribe(
            |key| key.starts_with(PRESENCE_KEY_PREFIX),
            |change| tracing::info!("Presence setting {} changed to {}", change.key, change.value),
        );

        let cancel = CancellationToken::new();
        let scheduler = UpdateScheduler::new(
            provider,
            storage,
            ActivityComposer::from_config(config),
            session.clone(),
            SchedulerConfig {
                poll_interval: config.poll_interval(),
                cooldown: config.cooldown(),
            },
        )
        .spawn(cancel.clone());

        Self {
            session,
            scheduler,
            cancel,
            settings_watch,
        }
    }

    pub fn session(&self) -> &PresenceSession {
        &self.session
    }

    /// Stop the update loop (letting a tick in progress finish), then close the session
    pub async fn shutdown(self) {
        tracing::info!("Shutting down presence engine");

        self.settings_watch.unsubscribe();
        self.cancel.cancel();
        if let Err(e) = self.scheduler.await {
            tracing::warn!("Presence update loop ended abnormally: {}", e);
        }

        self.session.shutdown().await;
    }
}
