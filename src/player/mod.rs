mod snapshot;
mod wire;

use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::HostBridge;

pub use snapshot::{Artist, Playback, PlayerSnapshot, PlayerState, Track};
pub use wire::HostPlayerState;

/// Source of player snapshots
#[async_trait]
pub trait PlayerStateProvider: Send + Sync {
    /// Never fails: anything that prevents reading the player yields
    /// [`PlayerSnapshot::Disabled`]
    async fn snapshot(&self) -> PlayerSnapshot;
}

/// Reads the player state from the host process over the HTTP bridge
pub struct HostPlayerProvider {
    bridge: Arc<HostBridge>,
}

impl HostPlayerProvider {
    pub fn new(bridge: Arc<HostBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl PlayerStateProvider for HostPlayerProvider {
    async fn snapshot(&self) -> PlayerSnapshot {
        match self.bridge.player_state().await {
            Ok(state) => state.into(),
            Err(e) => {
                tracing::debug!("Host player unavailable: {}", e);
                PlayerSnapshot::Disabled
            }
        }
    }
}
