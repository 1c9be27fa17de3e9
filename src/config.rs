use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const CONFIG_ENV: &str = "PRESENCE_SYNC_CONFIG";

/// Lower bound for the update poll so a zero interval cannot spin the loop
const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Discord Application ID used for the presence card
const DEFAULT_DISCORD_APP_ID: i64 = 1283109459463377011;

/// Language used for the text the engine adds to the presence card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Ru,
    En,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub discord_app_id: i64,
    pub bridge_url: String,
    pub bridge_timeout_ms: u64,
    pub change_feed_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub cooldown_secs: u64,
    pub retry_delay_secs: u64,
    pub handshake_timeout_secs: u64,
    pub track_url_base: String,
    pub cover_size: String,
    pub language: Language,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discord_app_id: DEFAULT_DISCORD_APP_ID,
            bridge_url: "http://127.0.0.1:2007".to_string(),
            bridge_timeout_ms: 2000,
            change_feed_interval_ms: 1000,
            poll_interval_ms: 500,
            cooldown_secs: 10,
            retry_delay_secs: 3,
            handshake_timeout_secs: 10,
            track_url_base: "https://music.yandex.ru/track".to_string(),
            cover_size: "300x300".to_string(),
            language: Language::Ru,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_timeout_ms)
    }

    pub fn change_feed_interval(&self) -> Duration {
        Duration::from_millis(self.change_feed_interval_ms)
    }

    /// Load the config from `$PRESENCE_SYNC_CONFIG` or the user config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Write the config back to the location `load` reads from
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        tracing::debug!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))
    }
}

fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Failed to get config directory".to_string()))?
        .join("presence-sync");

    Ok(dir.join(CONFIG_FILE))
}
