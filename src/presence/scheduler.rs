//! Periodic loop that pushes the player state into the presence session

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::activity::{ActivityComposer, Composition, PresenceSettings};
use super::session::PresenceSession;
use crate::bridge::{StorageBridge, PRESENCE_ENABLED};
use crate::player::PlayerStateProvider;

/// What a single tick ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Inside the cooldown window after the last sent update
    Throttled,
    SessionNotReady,
    Published,
    Cleared,
    /// The session refused the update; the cooldown is not restarted
    Dropped,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub cooldown: Duration,
}

pub struct UpdateScheduler {
    provider: Arc<dyn PlayerStateProvider>,
    storage: StorageBridge,
    composer: ActivityComposer,
    session: PresenceSession,
    config: SchedulerConfig,
    last_sent: Instant,
}

impl UpdateScheduler {
    /// The cooldown window opens here, so nothing is sent before one full
    /// cooldown has passed since construction.
    pub fn new(
        provider: Arc<dyn PlayerStateProvider>,
        storage: StorageBridge,
        composer: ActivityComposer,
        session: PresenceSession,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            composer,
            session,
            config,
            last_sent: Instant::now(),
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Tick until cancelled. The next tick is scheduled only once the previous
    /// one has finished, and cancellation never interrupts a tick in progress.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            "Presence updates every {:?} (cooldown {:?})",
            self.config.poll_interval,
            self.config.cooldown
        );

        while !cancel.is_cancelled() {
            match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(outcome) => tracing::trace!("Presence tick: {:?}", outcome),
                Err(_) => tracing::error!("Presence tick panicked; continuing"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("Presence update loop stopped");
    }

    pub async fn tick(&mut self) -> TickOutcome {
        if self.last_sent.elapsed() < self.config.cooldown {
            return TickOutcome::Throttled;
        }

        if !self.session.is_ready() {
            return TickOutcome::SessionNotReady;
        }

        let snapshot = self.provider.snapshot().await;

        let composition = if !snapshot.enabled() {
            Composition::Clear
        } else if !self.storage.get(&PRESENCE_ENABLED).await {
            tracing::debug!("Presence disabled in settings");
            Composition::Clear
        } else {
            let settings = PresenceSettings::read(&self.storage).await;
            self.composer.compose(&snapshot, &settings)
        };

        let (delivered, outcome) = match &composition {
            Composition::Publish(payload) => {
                tracing::debug!("Publishing activity: {:?}", payload);
                (self.session.publish(payload).await, TickOutcome::Published)
            }
            Composition::Clear => (self.session.clear().await, TickOutcome::Cleared),
        };

        if !delivered {
            return TickOutcome::Dropped;
        }

        self.last_sent = Instant::now();
        outcome
    }
}
