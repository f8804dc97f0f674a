use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const FAST_DURATION_MS: u64 = 80;
pub const SLOW_DURATION_MS: u64 = 500;
pub const COOL_DOWN_MS: u64 = 2000;
pub const REACTION_DISTANCE_MM: f64 = 250.0;
pub const MOVE_HEAD_DURATION_MS: u64 = 500;
/// Centimeters per second.
pub const WALK_SPEED: f64 = 1.0;
/// Four distance reads per second.
pub const SENSE_INTERVAL_MS: u64 = 250;
pub const JPEG_QUALITY: u8 = 75;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables of the reactive loops. Every field defaults to the compiled-in constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    pub reaction_threshold_mm: f64,
    pub poll_interval_ms: u64,
    pub cool_down_ms: u64,
    pub move_head_duration_ms: u64,
    pub walk_speed: f64,
    /// Extra pause between vision ticks. Zero runs as fast as capture allows.
    pub vision_interval_ms: u64,
    pub jpeg_quality: u8,
    pub fast_duration_ms: u64,
    pub slow_duration_ms: u64,
}

impl Default for ReflexConfig {
    fn default() -> Self {
        Self {
            reaction_threshold_mm: REACTION_DISTANCE_MM,
            poll_interval_ms: SENSE_INTERVAL_MS,
            cool_down_ms: COOL_DOWN_MS,
            move_head_duration_ms: MOVE_HEAD_DURATION_MS,
            walk_speed: WALK_SPEED,
            vision_interval_ms: 0,
            jpeg_quality: JPEG_QUALITY,
            fast_duration_ms: FAST_DURATION_MS,
            slow_duration_ms: SLOW_DURATION_MS,
        }
    }
}

impl ReflexConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid("jpeg_quality must be within 1..=100"));
        }
        if !self.reaction_threshold_mm.is_finite() || self.reaction_threshold_mm < 0.0 {
            return Err(ConfigError::Invalid("reaction_threshold_mm must be a non-negative number"));
        }
        if !self.walk_speed.is_finite() {
            return Err(ConfigError::Invalid("walk_speed must be finite"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cool_down(&self) -> Duration {
        Duration::from_millis(self.cool_down_ms)
    }

    pub fn vision_interval(&self) -> Duration {
        Duration::from_millis(self.vision_interval_ms)
    }
}
