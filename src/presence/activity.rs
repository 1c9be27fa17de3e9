//! Turns a player snapshot into the presence card to display

use chrono::{DateTime, Utc};

use crate::bridge::{StorageBridge, SHOW_BUTTON, SHOW_ON_PAUSE};
use crate::config::{EngineConfig, Language};
use crate::player::{Artist, Playback, PlayerSnapshot, PlayerState};

const COVER_SIZE_PLACEHOLDER: &str = "%%";
const PAUSED_SEPARATOR: &str = " • ";

/// The presence card sent to the presence service
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPayload {
    pub details: String,
    pub state_line: String,
    pub image_ref: Option<String>,
    pub timestamps: Option<Timestamps>,
    pub action_link: Option<ActionLink>,
}

/// Playback window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLink {
    pub label: String,
    pub url: String,
}

/// Result of composing: either a card to show or an instruction to hide it
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    Publish(ActivityPayload),
    Clear,
}

/// User toggles that shape the card, read fresh on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceSettings {
    pub show_on_pause: bool,
    pub show_action_button: bool,
}

impl PresenceSettings {
    pub async fn read(storage: &StorageBridge) -> Self {
        Self {
            show_on_pause: storage.get(&SHOW_ON_PAUSE).await,
            show_action_button: storage.get(&SHOW_BUTTON).await,
        }
    }
}

/// Localized strings the composer adds to the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub paused: String,
    pub open_track: String,
}

impl Labels {
    pub fn for_language(language: Language) -> Self {
        let (paused, open_track) = match language {
            Language::Ru => ("На паузе", "Открыть"),
            Language::En => ("Paused", "Open"),
        };
        Self {
            paused: paused.to_string(),
            open_track: open_track.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityComposer {
    labels: Labels,
    track_url_base: String,
    cover_size: String,
}

impl ActivityComposer {
    pub fn new(labels: Labels, track_url_base: impl Into<String>, cover_size: impl Into<String>) -> Self {
        Self {
            labels,
            track_url_base: track_url_base.into(),
            cover_size: cover_size.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Labels::for_language(config.language),
            config.track_url_base.clone(),
            config.cover_size.clone(),
        )
    }

    pub fn compose(&self, snapshot: &PlayerSnapshot, settings: &PresenceSettings) -> Composition {
        self.compose_at(snapshot, settings, Utc::now())
    }

    /// Compose against an explicit wall-clock time
    pub fn compose_at(
        &self,
        snapshot: &PlayerSnapshot,
        settings: &PresenceSettings,
        now: DateTime<Utc>,
    ) -> Composition {
        let PlayerSnapshot::Enabled(player) = snapshot else {
            return Composition::Clear;
        };

        if !player.is_playing && !settings.show_on_pause {
            return Composition::Clear;
        }

        let track = &player.track;
        let details = match &track.version {
            Some(version) => format!("{} {}", track.title, version),
            None => track.title.clone(),
        };

        let artists = join_artists(&track.artists);
        let state_line = if player.is_playing {
            artists
        } else if artists.is_empty() {
            self.labels.paused.clone()
        } else {
            format!("{}{}{}", self.labels.paused, PAUSED_SEPARATOR, artists)
        };

        let timestamps = if player.is_playing {
            playback_window(player, now.timestamp_millis())
        } else {
            None
        };

        let action_link = if settings.show_action_button {
            self.track_link(&track.id)
        } else {
            None
        };

        Composition::Publish(ActivityPayload {
            details,
            state_line,
            image_ref: self.cover_url(track.cover_uri_template.as_deref()),
            timestamps,
            action_link,
        })
    }

    fn cover_url(&self, template: Option<&str>) -> Option<String> {
        let template = template.map(str::trim).filter(|t| !t.is_empty())?;
        let resolved = template.replace(COVER_SIZE_PLACEHOLDER, &self.cover_size);

        if resolved.contains("://") {
            Some(resolved)
        } else {
            Some(format!("https://{}", resolved))
        }
    }

    fn track_link(&self, track_id: &str) -> Option<ActionLink> {
        if track_id.is_empty() {
            return None;
        }

        Some(ActionLink {
            label: self.labels.open_track.clone(),
            url: format!("{}/{}", self.track_url_base.trim_end_matches('/'), track_id),
        })
    }
}

fn join_artists(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Start/end such that a client can count down locally; `None` without a usable duration
fn playback_window(player: &PlayerState, now_ms: i64) -> Option<Timestamps> {
    let Playback {
        position_seconds: position,
        duration_seconds: duration,
    } = player.playback;
    if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
        return None;
    }

    let now = now_ms as f64;
    Some(Timestamps {
        start_ms: (now - position * 1000.0).round() as i64,
        end_ms: (now + (duration - position) * 1000.0).round() as i64,
    })
}
