//! Seismo-Sensor: motion sample sources
//!
//! The [`SensorSource`] contract, a tokio-driven [`PollingSensor`] over any
//! [`MotionDevice`], and a simulated accelerometer for development.

pub mod motion_patterns;
pub mod polling;
pub mod simulated;
pub mod source;
pub mod subscribers;

pub use motion_patterns::MotionPattern;
pub use polling::{PollingSensor, PollingStats};
pub use simulated::{SimulatedAccelerometer, SimulationConfig, GRAVITY_G};
pub use source::{MotionDevice, SampleCallback, SensorSource};
pub use subscribers::{Callback, SubscriberRegistry, SubscriptionId};
