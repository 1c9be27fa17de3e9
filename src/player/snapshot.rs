//! Point-in-time view of the host player

/// What the host player is doing right now.
///
/// A disabled player carries no track data at all, so nothing can read stale
/// fields from it.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSnapshot {
    /// The host is unreachable or has no player initialized
    Disabled,
    Enabled(PlayerState),
}

impl PlayerSnapshot {
    pub fn enabled(&self) -> bool {
        matches!(self, PlayerSnapshot::Enabled(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub is_playing: bool,
    pub track: Track,
    pub playback: Playback,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub version: Option<String>,
    /// Cover URL with a `%%` placeholder where the image size goes
    pub cover_uri_template: Option<String>,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub name: String,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Playback {
    pub position_seconds: f64,
    pub duration_seconds: f64,
}
