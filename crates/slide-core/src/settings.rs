//! Plain-data settings for a slide controller
//!
//! Durations are written the human way (`"3s"`, `"16ms"`) when settings come
//! from a file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SlideError;

/// Which directions a deck can be navigated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directions {
    /// `next()` and `prev()`
    #[default]
    Both,
    /// Only `next()`; backward steps are ignored
    ForwardOnly,
}

/// Controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideSettings {
    /// Number of navigable items
    pub count: usize,

    /// Wrap around at either end
    pub looping: bool,

    /// Advance automatically every `interval`
    pub auto_play: bool,

    /// Time between automatic transitions
    #[serde(with = "human_duration")]
    pub interval: Duration,

    /// Period of the progress ticker
    #[serde(with = "human_duration")]
    pub frame: Duration,

    pub directions: Directions,
}

impl Default for SlideSettings {
    fn default() -> Self {
        Self {
            count: 0,
            looping: false,
            auto_play: true,
            interval: Duration::from_secs(5),
            frame: Duration::from_millis(16), // ~60 FPS
            directions: Directions::Both,
        }
    }
}

impl SlideSettings {
    /// Settings for a deck of `count` items, everything else default
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Parse a duration such as `"3s"` or `"1500ms"`
    pub fn parse_duration(text: &str) -> Result<Duration, SlideError> {
        humantime::parse_duration(text)
            .map_err(|e| SlideError::Settings(format!("invalid duration '{}': {}", text, e)))
    }
}

mod human_duration {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::SlideSettings;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        SlideSettings::parse_duration(&text).map_err(D::Error::custom)
    }
}
