//! Timer-driven sensor source polling a motion device

use crate::source::{MotionDevice, SampleCallback, SensorSource};
use crate::subscribers::{SubscriberRegistry, SubscriptionId};
use parking_lot::Mutex;
use seismo_core::{MonotonicClock, Sample, SeismoError, SeismoResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Counters describing a polling sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollingStats {
    pub samples_delivered: u64,
    pub read_errors: u64,
}

/// Sensor source that reads a [`MotionDevice`] once per tick of a tokio interval
pub struct PollingSensor<D: MotionDevice> {
    shared: Arc<Shared<D>>,
    shutdown: Option<watch::Sender<bool>>,
    interval: Option<Duration>,
}

struct Shared<D> {
    // Held for the whole tick; stop() takes it to wait out an in-flight tick.
    device: Mutex<D>,
    subscribers: Mutex<SubscriberRegistry<Sample>>,
    running: AtomicBool,
    generation: AtomicU64,
    clock: MonotonicClock,
    samples_delivered: AtomicU64,
    read_errors: AtomicU64,
}

impl<D: MotionDevice> Shared<D> {
    /// One tick: read the device and deliver the sample to every subscriber.
    /// Returns the delivered sample, or `None` if nothing was delivered.
    fn tick(&self, generation: u64) -> Option<Sample> {
        let mut device = self.device.lock();

        if !self.running.load(Ordering::Acquire)
            || self.generation.load(Ordering::Acquire) != generation
        {
            return None;
        }

        let acceleration = match device.read() {
            Ok(acceleration) => acceleration,
            Err(e) => {
                self.read_errors.fetch_add(1, Ordering::Relaxed);
                warn!(device = device.name(), error = %e, "motion read failed, skipping tick");
                return None;
            }
        };

        let sample = Sample::from_acceleration(self.clock.now(), acceleration);
        let callbacks = self.subscribers.lock().snapshot();
        SubscriberRegistry::notify(&callbacks, &sample);
        self.samples_delivered.fetch_add(1, Ordering::Relaxed);

        Some(sample)
    }
}

impl<D: MotionDevice> PollingSensor<D> {
    /// Create a stopped sensor over `device`
    pub fn new(device: D) -> Self {
        Self::with_clock(device, MonotonicClock::new())
    }

    /// Create a stopped sensor stamping samples with `clock`
    pub fn with_clock(device: D, clock: MonotonicClock) -> Self {
        PollingSensor {
            shared: Arc::new(Shared {
                device: Mutex::new(device),
                subscribers: Mutex::new(SubscriberRegistry::new()),
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                clock,
                samples_delivered: AtomicU64::new(0),
                read_errors: AtomicU64::new(0),
            }),
            shutdown: None,
            interval: None,
        }
    }

    /// Run a single tick synchronously, outside the timer.
    /// Does nothing while the sensor is stopped.
    pub fn poll_once(&self) -> Option<Sample> {
        let generation = self.shared.generation.load(Ordering::Acquire);
        self.shared.tick(generation)
    }

    /// Number of registered sample subscribers
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().len()
    }

    /// Interval of the current sampling session, if running
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn stats(&self) -> PollingStats {
        PollingStats {
            samples_delivered: self.shared.samples_delivered.load(Ordering::Relaxed),
            read_errors: self.shared.read_errors.load(Ordering::Relaxed),
        }
    }

    /// Run `f` against the underlying device, waiting for any in-flight tick
    pub fn with_device<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut *self.shared.device.lock())
    }
}

impl<D: MotionDevice> SensorSource for PollingSensor<D> {
    fn start(&mut self, interval: Duration) -> SeismoResult<()> {
        if self.shared.running.load(Ordering::Acquire) {
            debug!("sensor already running, ignoring start");
            return Ok(());
        }

        if interval.is_zero() {
            return Err(SeismoError::InvalidConfiguration {
                reason: "sampling interval must be positive".to_string(),
            });
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            SeismoError::sensor_unavailable("no tokio runtime available to drive sampling")
        })?;

        let generation = {
            let mut device = self.shared.device.lock();
            device.open()?;
            let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
            self.shared.running.store(true, Ordering::Release);
            info!(
                device = device.name(),
                interval_ms = interval.as_secs_f64() * 1000.0,
                "motion sampling started"
            );
            generation
        };

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);

        handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        shared.tick(generation);
                    }
                    // Fires on stop() and when the sender is dropped
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }
        });

        self.shutdown = Some(shutdown_tx);
        self.interval = Some(interval);

        Ok(())
    }

    fn stop(&mut self) {
        {
            let mut device = self.shared.device.lock();
            if !self.shared.running.swap(false, Ordering::AcqRel) {
                return;
            }
            device.close();
            info!(
                device = device.name(),
                samples = self.shared.samples_delivered.load(Ordering::Relaxed),
                "motion sampling stopped"
            );
        }

        // The polling task exits at its next select
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        self.interval = None;
    }

    fn on_sample(&mut self, callback: SampleCallback) -> SubscriptionId {
        let id = self.shared.subscribers.lock().add(callback);
        debug!(subscription = %id, "sample subscriber added");
        id
    }

    fn remove_subscriber(&mut self, id: SubscriptionId) -> bool {
        let removed = self.shared.subscribers.lock().remove(id);
        if removed {
            debug!(subscription = %id, "sample subscriber removed");
        }
        removed
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl<D: MotionDevice> Drop for PollingSensor<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
