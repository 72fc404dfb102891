use crate::common::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Application configuration, read from `mapscene.toml`.
///
/// Every field carries a default so a missing or partial file still yields
/// a usable configuration (an unbounded window admits everything).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Start of the visible date window, RFC 3339.
    #[serde(default = "default_window_start")]
    pub start_date: DateTime<Utc>,

    /// End of the visible date window, RFC 3339.
    #[serde(default = "default_window_end")]
    pub end_date: DateTime<Utc>,

    /// Renderer-capability hint: true when the host's emoji renderer draws
    /// regional-indicator flag pairs as two-letter boxes, enabling the
    /// location-emoji substitution during normalization.
    #[serde(default)]
    pub flag_emoji_fallback: bool,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default)]
    pub events_url: Option<String>,

    #[serde(default)]
    pub locations_url: Option<String>,

    #[serde(default)]
    pub append_events_url: Option<String>,
}

fn default_window_start() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

fn default_window_end() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_date: default_window_start(),
            end_date: default_window_end(),
            flag_emoji_fallback: false,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            events_url: None,
            locations_url: None,
            append_events_url: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from("mapscene.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;

        let config: AppConfig = toml::from_str(&content)?;
        if config.end_date < config.start_date {
            return Err(IngestError::Config(
                "end_date precedes start_date".to_string(),
            ));
        }
        Ok(config)
    }
}
