mod activity;
mod scheduler;
mod session;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{
    ActionLink, ActivityComposer, ActivityPayload, Composition, Labels, PresenceSettings,
    Timestamps,
};
pub use scheduler::{SchedulerConfig, TickOutcome, UpdateScheduler};
pub use session::{PresenceSession, SessionState};
pub use transport::{PresenceConnection, PresenceTransport};
