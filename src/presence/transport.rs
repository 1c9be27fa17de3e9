use async_trait::async_trait;

use super::activity::ActivityPayload;
use crate::error::Result;

/// Client side of a presence service (Discord, etc.)
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Returns the name of this presence service (for logging)
    fn name(&self) -> &'static str;

    /// Open a new session; resolves once the service has accepted it
    async fn connect(&self) -> Result<Box<dyn PresenceConnection>>;
}

/// An established session with a presence service
#[async_trait]
pub trait PresenceConnection: Send + Sync {
    /// Replace the displayed activity
    async fn set_activity(&self, payload: &ActivityPayload) -> Result<()>;

    /// Hide the displayed activity
    async fn clear_activity(&self) -> Result<()>;

    /// Resolves when the service disconnects or the session fails
    async fn closed(&self);

    /// Close the session from our side
    async fn disconnect(&self);
}
