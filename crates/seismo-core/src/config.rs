//! Engine configuration

use crate::config_error;
use crate::error::{SeismoError, SeismoResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable surface of the sampling and smoothing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling period of the sensor source
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,
    /// EMA weight α in (0, 1]; higher is more responsive, lower is smoother
    pub smoothing_factor: f64,
    /// Maximum number of readings kept in history
    pub history_capacity: usize,
    /// Clear history whenever the engine is started
    pub reset_on_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            smoothing_factor: 0.2,
            history_capacity: 500,
            reset_on_start: false,
        }
    }
}

impl EngineConfig {
    /// Responsive settings for a needle gauge showing the latest reading
    pub fn needle() -> Self {
        Self {
            smoothing_factor: 0.5,
            history_capacity: 100,
            ..Self::default()
        }
    }

    /// Smooth settings for a scrolling graph backed by a long history
    pub fn graph() -> Self {
        Self {
            smoothing_factor: 0.1,
            history_capacity: 1000,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_smoothing_factor(mut self, smoothing_factor: f64) -> Self {
        self.smoothing_factor = smoothing_factor;
        self
    }

    pub fn with_history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }

    pub fn with_reset_on_start(mut self, reset_on_start: bool) -> Self {
        self.reset_on_start = reset_on_start;
        self
    }

    /// Validate every option; nothing should be built from an invalid config
    pub fn validate(&self) -> SeismoResult<()> {
        if self.interval.is_zero() {
            return Err(config_error!("sampling interval must be positive"));
        }

        validate_smoothing_factor(self.smoothing_factor)?;

        if self.history_capacity == 0 {
            return Err(config_error!("history capacity must be greater than 0"));
        }

        Ok(())
    }

    /// Sampling rate implied by the interval
    pub fn sampling_rate_hz(&self) -> f64 {
        1.0 / self.interval.as_secs_f64()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> SeismoResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SeismoError::SerializationError {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import and validate configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> SeismoResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| SeismoError::SerializationError {
                reason: format!("Failed to deserialize configuration: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> SeismoResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SeismoError::SerializationError {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }
}

/// Check that α lies in (0, 1]
pub fn validate_smoothing_factor(alpha: f64) -> SeismoResult<()> {
    if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(config_error!("smoothing factor {} outside (0, 1]", alpha))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
