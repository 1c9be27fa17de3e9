//! Scripted fakes shared by the presence tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::activity::ActivityPayload;
use super::transport::{PresenceConnection, PresenceTransport};
use crate::error::{Error, Result};
use crate::player::{Artist, Playback, PlayerSnapshot, PlayerState, PlayerStateProvider, Track};

#[derive(Debug, Clone)]
pub enum Sent {
    Activity(ActivityPayload, Instant),
    Clear(Instant),
}

impl Sent {
    pub fn at(&self) -> Instant {
        match self {
            Sent::Activity(_, at) | Sent::Clear(at) => *at,
        }
    }
}

/// Transport whose connection attempts succeed or fail following a script;
/// attempts beyond the script succeed
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<bool>>,
    attempts: AtomicUsize,
    disconnects: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<Sent>>>,
    live: Mutex<Option<CancellationToken>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: AtomicUsize::new(0),
            disconnects: Arc::new(AtomicUsize::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
            live: Mutex::new(None),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Simulate the service going away
    pub fn drop_connection(&self) {
        if let Some(token) = self.live.lock().unwrap().take() {
            token.cancel();
        }
    }
}

#[async_trait]
impl PresenceTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn connect(&self) -> Result<Box<dyn PresenceConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let succeed = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
        if !succeed {
            return Err(Error::Handshake("scripted failure".to_string()));
        }

        let closed = CancellationToken::new();
        *self.live.lock().unwrap() = Some(closed.clone());
        Ok(Box::new(ScriptedConnection {
            closed,
            disconnects: Arc::clone(&self.disconnects),
            sent: Arc::clone(&self.sent),
        }))
    }
}

struct ScriptedConnection {
    closed: CancellationToken,
    disconnects: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<Sent>>>,
}

#[async_trait]
impl PresenceConnection for ScriptedConnection {
    async fn set_activity(&self, payload: &ActivityPayload) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::TransportClosed);
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Activity(payload.clone(), Instant::now()));
        Ok(())
    }

    async fn clear_activity(&self) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::TransportClosed);
        }
        self.sent.lock().unwrap().push(Sent::Clear(Instant::now()));
        Ok(())
    }

    async fn closed(&self) {
        self.closed.cancelled().await;
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.closed.cancel();
    }
}

/// Player that is always playing and switches to a new track on every snapshot
#[derive(Default)]
pub struct ChangingPlayer {
    calls: AtomicUsize,
    panic_on_first: bool,
}

impl ChangingPlayer {
    pub fn panicking_once() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            panic_on_first: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayerStateProvider for ChangingPlayer {
    async fn snapshot(&self) -> PlayerSnapshot {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_first && call == 0 {
            panic!("player bridge blew up");
        }
        playing_snapshot(&format!("Track {}", call))
    }
}

/// Player with a fixed snapshot
pub struct FixedPlayer(pub PlayerSnapshot);

#[async_trait]
impl PlayerStateProvider for FixedPlayer {
    async fn snapshot(&self) -> PlayerSnapshot {
        self.0.clone()
    }
}

pub fn playing_snapshot(title: &str) -> PlayerSnapshot {
    PlayerSnapshot::Enabled(PlayerState {
        is_playing: true,
        track: Track {
            id: "1".to_string(),
            title: title.to_string(),
            version: None,
            cover_uri_template: Some("avatars.example.net/%%".to_string()),
            artists: vec![Artist::new("Artist")],
        },
        playback: Playback {
            position_seconds: 30.0,
            duration_seconds: 180.0,
        },
    })
}

pub fn sample_payload(details: &str) -> ActivityPayload {
    ActivityPayload {
        details: details.to_string(),
        state_line: "Artist".to_string(),
        image_ref: None,
        timestamps: None,
        action_link: None,
    }
}
