//! Raw motion samples and the readings derived from them

use crate::error::{SeismoError, SeismoResult};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// One 3-axis acceleration measurement, in g
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector; always non-negative.
    /// Computed with `hypot` so large finite axes do not overflow early.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Timestamped acceleration sample produced by a sensor source on each tick
///
/// Fields are private so a sample cannot change once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: Timestamp,
    acceleration: Acceleration,
}

impl Sample {
    pub const fn new(timestamp: Timestamp, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp,
            acceleration: Acceleration::new(x, y, z),
        }
    }

    pub const fn from_acceleration(timestamp: Timestamp, acceleration: Acceleration) -> Self {
        Self { timestamp, acceleration }
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.acceleration.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.acceleration.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.acceleration.z
    }

    #[inline]
    pub fn acceleration(&self) -> Acceleration {
        self.acceleration
    }

    /// `sqrt(x² + y² + z²)`
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.acceleration.magnitude()
    }

    /// Reject samples whose axes or magnitude are NaN or infinite
    pub fn validate(&self) -> SeismoResult<()> {
        if self.acceleration.is_finite() && self.magnitude().is_finite() {
            Ok(())
        } else {
            Err(SeismoError::InvalidSample {
                reason: format!(
                    "non-finite acceleration ({}, {}, {}) at {}",
                    self.x(),
                    self.y(),
                    self.z(),
                    self.timestamp
                ),
            })
        }
    }
}

/// Result of processing one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReading {
    /// Timestamp of the sample this reading was derived from
    pub timestamp: Timestamp,
    /// Raw vector magnitude
    pub magnitude: f64,
    /// Exponentially smoothed magnitude
    pub smoothed_magnitude: f64,
}

impl ProcessedReading {
    /// Deviation of the smoothed signal from a resting level (1 g at rest)
    pub fn deflection_from(&self, resting_level: f64) -> f64 {
        self.smoothed_magnitude - resting_level
    }
}
