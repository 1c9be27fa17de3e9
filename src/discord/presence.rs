//! Discord Rich Presence integration using discord-sdk

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use discord_sdk::{
    activity::{ActivityBuilder, Assets, Button},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::{watch, Mutex};

use crate::error::{Error, Result};
use crate::presence::{ActivityPayload, PresenceConnection, PresenceTransport};

/// Discord rejects activity text longer than this
const MAX_FIELD_CHARS: usize = 128;

/// Opens Discord IPC sessions for one application id
pub struct DiscordTransport {
    app_id: i64,
    handshake_timeout: Duration,
}

impl DiscordTransport {
    pub fn new(app_id: i64, handshake_timeout: Duration) -> Self {
        Self {
            app_id,
            handshake_timeout,
        }
    }
}

#[async_trait]
impl PresenceTransport for DiscordTransport {
    fn name(&self) -> &'static str {
        "Discord"
    }

    async fn connect(&self) -> Result<Box<dyn PresenceConnection>> {
        let (wheel, handler) = Wheel::new(Box::new(|err| {
            tracing::warn!("Discord error: {:?}", err);
        }));

        let mut user_spoke = wheel.user();

        let discord = Discord::new(self.app_id, Subscriptions::ACTIVITY, Box::new(handler))
            .map_err(|e| Error::Discord(format!("{:?}", e)))?;

        let handshake = tokio::time::timeout(self.handshake_timeout, async {
            if user_spoke.0.changed().await.is_err() {
                Err("Discord connection closed".to_string())
            } else {
                match &*user_spoke.0.borrow() {
                    UserState::Connected(user) => Ok(user.clone()),
                    UserState::Disconnected(err) => Err(format!("Discord disconnected: {:?}", err)),
                }
            }
        })
        .await;

        let user = match handshake {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                discord.disconnect().await;
                return Err(Error::Handshake(e));
            }
            Err(_) => {
                discord.disconnect().await;
                return Err(Error::Handshake("Discord handshake timed out".to_string()));
            }
        };

        tracing::info!(
            "Discord Rich Presence connected as {}#{}",
            user.username,
            user.discriminator.unwrap_or(0)
        );

        Ok(Box::new(DiscordConnection {
            discord: Mutex::new(Some(discord)),
            user: user_spoke.0,
        }))
    }
}

struct DiscordConnection {
    discord: Mutex<Option<Discord>>,
    user: watch::Receiver<UserState>,
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_FIELD_CHARS).collect()
}

fn epoch_millis(ms: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms.max(0) as u64)
}

fn build_activity(payload: &ActivityPayload) -> ActivityBuilder {
    let mut activity = ActivityBuilder::new().details(truncate(&payload.details));

    if !payload.state_line.is_empty() {
        activity = activity.state(truncate(&payload.state_line));
    }

    if let Some(image) = &payload.image_ref {
        activity = activity.assets(Assets::default().large(image.as_str(), None::<&str>));
    }

    if let Some(timestamps) = payload.timestamps {
        activity = activity
            .start_timestamp(epoch_millis(timestamps.start_ms))
            .end_timestamp(epoch_millis(timestamps.end_ms));
    }

    if let Some(link) = &payload.action_link {
        activity = activity.button(Button {
            label: truncate(&link.label),
            url: link.url.clone(),
        });
    }

    activity
}

#[async_trait]
impl PresenceConnection for DiscordConnection {
    async fn set_activity(&self, payload: &ActivityPayload) -> Result<()> {
        let guard = self.discord.lock().await;
        let discord = guard.as_ref().ok_or(Error::TransportClosed)?;

        discord
            .update_activity(build_activity(payload))
            .await
            .map(|_| ())
            .map_err(|e| Error::Discord(format!("{:?}", e)))
    }

    async fn clear_activity(&self) -> Result<()> {
        let guard = self.discord.lock().await;
        let discord = guard.as_ref().ok_or(Error::TransportClosed)?;

        discord
            .clear_activity()
            .await
            .map(|_| ())
            .map_err(|e| Error::Discord(format!("{:?}", e)))
    }

    async fn closed(&self) {
        let mut user = self.user.clone();
        loop {
            if matches!(&*user.borrow_and_update(), UserState::Disconnected(_)) {
                return;
            }
            if user.changed().await.is_err() {
                return;
            }
        }
    }

    async fn disconnect(&self) {
        if let Some(discord) = self.discord.lock().await.take() {
            discord.disconnect().await;
            tracing::info!("Discord Rich Presence disconnected");
        }
    }
}
