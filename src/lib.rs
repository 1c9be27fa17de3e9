pub mod bridge;
pub mod config;
pub mod discord;
pub mod engine;
pub mod error;
pub mod logging;
pub mod player;
pub mod presence;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bridge::{HostBridge, StorageBridge};
use config::EngineConfig;
use discord::DiscordTransport;
use engine::PresenceEngine;
use error::Result;
use player::HostPlayerProvider;

/// Run the engine against the host bridge and Discord until Ctrl-C
pub async fn run() -> Result<()> {
    let config = EngineConfig::load()?;
    tracing::info!("Using host bridge at {}", config.bridge_url);

    let bridge = Arc::new(HostBridge::new(&config.bridge_url, config.bridge_timeout())?);
    let feed_cancel = CancellationToken::new();
    let change_feed = bridge.spawn_change_feed(config.change_feed_interval(), feed_cancel.clone());

    let engine = PresenceEngine::start(
        &config,
        StorageBridge::new(bridge.clone()),
        Arc::new(HostPlayerProvider::new(bridge)),
        Arc::new(DiscordTransport::new(
            config.discord_app_id,
            config.handshake_timeout(),
        )),
    );

    tokio::signal::ctrl_c().await?;

    engine.shutdown().await;
    feed_cancel.cancel();
    if let Err(e) = change_feed.await {
        tracing::warn!("Storage change feed ended abnormally: {}", e);
    }

    Ok(())
}
