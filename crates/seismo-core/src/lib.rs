//! Seismo-Core: Foundation types for motion sampling
//!
//! Samples, processed readings, monotonic timestamps, configuration and the
//! shared error type.

pub mod config;
pub mod error;
pub mod sample;
pub mod timestamp;

pub use config::{validate_smoothing_factor, EngineConfig};
pub use error::{SeismoError, SeismoResult};
pub use sample::{Acceleration, ProcessedReading, Sample};
pub use timestamp::{MonotonicClock, Timestamp};
