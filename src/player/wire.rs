//! JSON shape of the player state as reported by the host

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::snapshot::{Artist, Playback, PlayerSnapshot, PlayerState, Track};

#[derive(Debug, Default, Deserialize)]
pub struct HostPlayerState {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostPlayerData {
    #[serde(default)]
    is_playing: Option<bool>,
    track_meta: HostTrackMeta,
    #[serde(default)]
    playback: Option<HostPlayback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostTrackMeta {
    #[serde(default, deserialize_with = "id_as_string")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    cover_uri: Option<String>,
    #[serde(default)]
    artists: Option<Vec<HostArtist>>,
}

#[derive(Debug, Deserialize)]
struct HostArtist {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HostPlayback {
    #[serde(default)]
    position: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Track ids arrive either as strings or as bare numbers
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

impl From<HostPlayerState> for PlayerSnapshot {
    fn from(state: HostPlayerState) -> Self {
        if !state.enabled {
            return PlayerSnapshot::Disabled;
        }

        let Some(data) = state.data else {
            tracing::debug!("Host reported an enabled player without data");
            return PlayerSnapshot::Disabled;
        };

        let data: HostPlayerData = match serde_json::from_value(data) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Ignoring malformed player state: {}", e);
                return PlayerSnapshot::Disabled;
            }
        };

        let meta = data.track_meta;
        let playback = data.playback.unwrap_or_default();
        PlayerSnapshot::Enabled(PlayerState {
            is_playing: data.is_playing.unwrap_or(false),
            track: Track {
                id: meta.id,
                title: meta.title.unwrap_or_default(),
                version: non_empty(meta.version),
                cover_uri_template: non_empty(meta.cover_uri),
                artists: meta
                    .artists
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|a| non_empty(a.name))
                    .map(Artist::new)
                    .collect(),
            },
            playback: Playback {
                position_seconds: finite_or_zero(playback.position),
                duration_seconds: finite_or_zero(playback.duration),
            },
        })
    }
}
