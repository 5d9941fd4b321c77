//! Sensor source and motion device contracts

use crate::subscribers::{Callback, SubscriptionId};
use seismo_core::{Acceleration, Sample, SeismoResult};
use std::time::Duration;

/// Callback receiving each sample produced by a sensor source
pub type SampleCallback = Callback<Sample>;

/// Periodic producer of motion samples
///
/// Subscribers are invoked synchronously, once per tick, in registration
/// order. A callback must not call back into the source that invoked it.
pub trait SensorSource: Send {
    /// Begin sampling at `interval`. Fails with `SensorUnavailable` when the
    /// hardware is absent or access is denied. No-op while already running.
    fn start(&mut self, interval: Duration) -> SeismoResult<()>;

    /// Halt sampling. Idempotent. Waits for an in-flight tick to finish and
    /// guarantees no delivery after it returns.
    fn stop(&mut self);

    /// Register a sample subscriber
    fn on_sample(&mut self, callback: SampleCallback) -> SubscriptionId;

    /// Unregister a sample subscriber, returning whether it was registered
    fn remove_subscriber(&mut self, id: SubscriptionId) -> bool;

    /// Whether the source is currently sampling
    fn is_running(&self) -> bool;
}

/// Hardware seam underneath a polling sensor source
pub trait MotionDevice: Send + 'static {
    /// Acquire the device. Missing hardware or a refused permission must be
    /// reported as `SensorUnavailable`.
    fn open(&mut self) -> SeismoResult<()>;

    /// Read the current acceleration without blocking
    fn read(&mut self) -> SeismoResult<Acceleration>;

    /// Release the device
    fn close(&mut self) {}

    /// Human-readable device name for logs
    fn name(&self) -> &str;
}
