//! Error handling for the Seismo engine
//!
//! One error type covers sensor access, configuration and sample validation.
//! Absence of data (no readings yet) is never an error and is modelled with
//! `Option` by the callers.

use core::fmt;

/// Result type alias for Seismo operations
pub type SeismoResult<T> = Result<T, SeismoError>;

/// Error type for all Seismo operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SeismoError {
    /// Motion hardware is missing or access was denied
    SensorUnavailable {
        /// Why the sensor could not be used
        reason: String,
    },

    /// Configuration rejected at construction time
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// Sample carrying non-finite axis values
    InvalidSample {
        /// Description of the sample issue
        reason: String,
    },

    /// Transient failure while reading an open device
    DeviceError {
        /// Device-related error description
        reason: String,
    },

    /// Serialization/deserialization error
    SerializationError {
        /// Serialization error description
        reason: String,
    },
}

impl SeismoError {
    /// Shorthand for a `SensorUnavailable` error
    pub fn sensor_unavailable(reason: impl Into<String>) -> Self {
        SeismoError::SensorUnavailable { reason: reason.into() }
    }

    /// Shorthand for a `DeviceError`
    pub fn device(reason: impl Into<String>) -> Self {
        SeismoError::DeviceError { reason: reason.into() }
    }

    /// Whether the caller may retry after user remediation (e.g. granting permission)
    pub fn is_sensor_unavailable(&self) -> bool {
        matches!(self, SeismoError::SensorUnavailable { .. })
    }
}

impl fmt::Display for SeismoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeismoError::SensorUnavailable { reason } => {
                write!(f, "Sensor unavailable: {}", reason)
            }
            SeismoError::InvalidConfiguration { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            SeismoError::InvalidSample { reason } => {
                write!(f, "Invalid sample: {}", reason)
            }
            SeismoError::DeviceError { reason } => {
                write!(f, "Device error: {}", reason)
            }
            SeismoError::SerializationError { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for SeismoError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::SeismoError::InvalidConfiguration {
            reason: format!($($arg)+)
        }
    };
}
