//! Engine coordinating a sensor source, the signal processor and display subscribers
//!
//! Each sensor tick runs `ingest -> notify` synchronously while holding the
//! engine's tick lock, so `stop()` and `reset()` never observe half a tick.
//! The processor lock is released before subscribers run: a subscriber may
//! read `latest()` or `history()` through an [`EngineView`], but must not
//! call `reset()` or any lifecycle method from inside its callback.

use crate::processor::SignalProcessor;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use seismo_core::{EngineConfig, ProcessedReading, Sample, SeismoResult};
use seismo_sensor::{Callback, SensorSource, SubscriberRegistry, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Callback receiving each processed reading
pub type ReadingCallback = Callback<ProcessedReading>;

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Stopped,
    Running,
}

/// Snapshot of engine activity for the current (or last) session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub state: EngineState,
    pub session_id: Option<Uuid>,
    pub session_started_at: Option<DateTime<Utc>>,
    pub readings_processed: u64,
    pub samples_rejected: u64,
    pub peak_smoothed_magnitude: Option<f64>,
    pub history_len: usize,
    pub smoothing_factor: f64,
}

#[derive(Debug, Default)]
struct SessionCounters {
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    readings_processed: u64,
    samples_rejected: u64,
    peak_smoothed_magnitude: Option<f64>,
}

impl SessionCounters {
    fn begin(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        *self = SessionCounters {
            session_id: Some(id),
            started_at: Some(Utc::now()),
            ..SessionCounters::default()
        };
        id
    }

    fn record(&mut self, reading: &ProcessedReading) {
        self.readings_processed += 1;
        self.peak_smoothed_magnitude = Some(match self.peak_smoothed_magnitude {
            Some(peak) => peak.max(reading.smoothed_magnitude),
            None => reading.smoothed_magnitude,
        });
    }
}

struct EngineInner {
    tick: Mutex<()>,
    // False outside a session; late ticks from a stopping sensor are dropped.
    accepting: AtomicBool,
    processor: Mutex<SignalProcessor>,
    subscribers: Mutex<SubscriberRegistry<ProcessedReading>>,
    counters: Mutex<SessionCounters>,
}

impl EngineInner {
    fn handle_sample(&self, sample: &Sample) {
        let _tick = self.tick.lock();
        if !self.accepting.load(Ordering::Acquire) {
            return;
        }

        let result = self.processor.lock().ingest(sample);
        match result {
            Ok(reading) => {
                self.counters.lock().record(&reading);
                let callbacks = self.subscribers.lock().snapshot();
                SubscriberRegistry::notify(&callbacks, &reading);
            }
            Err(e) => {
                self.counters.lock().samples_rejected += 1;
                warn!(error = %e, "sample rejected");
            }
        }
    }

    fn reset(&self) {
        let _tick = self.tick.lock();
        self.processor.lock().reset();
        self.counters.lock().peak_smoothed_magnitude = None;
    }
}

/// Cloneable read-only access to the engine's readings
///
/// Safe to use from inside a reading subscriber. A view captured by a
/// subscriber keeps the engine state alive until that subscriber is removed.
#[derive(Clone)]
pub struct EngineView {
    inner: Arc<EngineInner>,
}

impl EngineView {
    pub fn latest(&self) -> Option<ProcessedReading> {
        self.inner.processor.lock().latest()
    }

    /// Snapshot of the reading history, oldest first
    pub fn history(&self) -> Vec<ProcessedReading> {
        self.inner.processor.lock().history()
    }
}

/// Motion sampling and smoothing engine
pub struct Engine<S: SensorSource> {
    config: EngineConfig,
    sensor: S,
    inner: Arc<EngineInner>,
    state: EngineState,
    sensor_subscription: Option<SubscriptionId>,
}

impl<S: SensorSource> Engine<S> {
    /// Create a stopped engine. The configuration is validated first and
    /// nothing is built if it is invalid.
    pub fn new(config: EngineConfig, sensor: S) -> SeismoResult<Self> {
        config.validate()?;
        let processor = SignalProcessor::from_config(&config)?;

        Ok(Engine {
            config,
            sensor,
            inner: Arc::new(EngineInner {
                tick: Mutex::new(()),
                accepting: AtomicBool::new(false),
                processor: Mutex::new(processor),
                subscribers: Mutex::new(SubscriberRegistry::new()),
                counters: Mutex::new(SessionCounters::default()),
            }),
            state: EngineState::Stopped,
            sensor_subscription: None,
        })
    }

    /// Subscribe to the sensor and begin processing. No-op while running.
    ///
    /// On `SensorUnavailable` the subscription is withdrawn and the engine
    /// stays stopped; the caller may retry after the user grants access.
    pub fn start(&mut self) -> SeismoResult<()> {
        if self.state == EngineState::Running {
            debug!("engine already running, ignoring start");
            return Ok(());
        }

        let inner = Arc::clone(&self.inner);
        let subscription = self
            .sensor
            .on_sample(Arc::new(move |sample: &Sample| inner.handle_sample(sample)));

        if let Err(e) = self.sensor.start(self.config.interval) {
            self.sensor.remove_subscriber(subscription);
            warn!(error = %e, "engine failed to start");
            return Err(e);
        }

        {
            let _tick = self.inner.tick.lock();
            if self.config.reset_on_start {
                self.inner.processor.lock().reset();
            }
            let session = self.inner.counters.lock().begin();
            self.inner.accepting.store(true, Ordering::Release);
            info!(
                session = %session,
                interval_ms = self.config.interval.as_secs_f64() * 1000.0,
                smoothing_factor = self.inner.processor.lock().smoothing_factor(),
                reset_on_start = self.config.reset_on_start,
                "engine started"
            );
        }

        self.sensor_subscription = Some(subscription);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Stop processing and unsubscribe from the sensor. History is kept.
    /// Waits for an in-flight tick; no-op while stopped.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }

        {
            let _tick = self.inner.tick.lock();
            self.inner.accepting.store(false, Ordering::Release);
        }

        self.sensor.stop();
        if let Some(subscription) = self.sensor_subscription.take() {
            self.sensor.remove_subscriber(subscription);
        }
        self.state = EngineState::Stopped;

        let counters = self.inner.counters.lock();
        info!(
            session = ?counters.session_id,
            readings = counters.readings_processed,
            rejected = counters.samples_rejected,
            "engine stopped"
        );
    }

    /// Register a display subscriber, notified once per processed reading
    pub fn on_reading<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ProcessedReading) + Send + Sync + 'static,
    {
        let id = self.inner.subscribers.lock().add(Arc::new(callback));
        debug!(subscription = %id, "reading subscriber added");
        id
    }

    pub fn remove_reading_subscriber(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.lock().remove(id)
    }

    pub fn latest(&self) -> Option<ProcessedReading> {
        self.view().latest()
    }

    /// Snapshot of the reading history, oldest first
    pub fn history(&self) -> Vec<ProcessedReading> {
        self.view().history()
    }

    /// Read-only handle for display code and subscribers
    pub fn view(&self) -> EngineView {
        EngineView {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Clear history and smoothing state; the next reading re-seeds the average
    pub fn reset(&self) {
        self.inner.reset();
        debug!("engine history reset");
    }

    /// Change sensitivity while running or stopped
    pub fn set_smoothing_factor(&mut self, alpha: f64) -> SeismoResult<()> {
        self.inner.processor.lock().set_smoothing_factor(alpha)?;
        self.config.smoothing_factor = alpha;
        info!(smoothing_factor = alpha, "sensitivity changed");
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn stats(&self) -> EngineStats {
        let (history_len, smoothing_factor) = {
            let processor = self.inner.processor.lock();
            (processor.len(), processor.smoothing_factor())
        };
        let counters = self.inner.counters.lock();

        EngineStats {
            state: self.state,
            session_id: counters.session_id,
            session_started_at: counters.started_at,
            readings_processed: counters.readings_processed,
            samples_rejected: counters.samples_rejected,
            peak_smoothed_magnitude: counters.peak_smoothed_magnitude,
            history_len,
            smoothing_factor,
        }
    }
}

impl<S: SensorSource> Drop for Engine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seismo_core::{Acceleration, SeismoError};
    use seismo_sensor::{MotionDevice, PollingSensor};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Device replaying z-axis magnitudes, then repeating the last one
    struct ScriptedDevice {
        magnitudes: VecDeque<f64>,
        last: f64,
        denied: bool,
    }

    impl ScriptedDevice {
        fn new(magnitudes: &[f64]) -> Self {
            Self {
                magnitudes: magnitudes.iter().copied().collect(),
                last: 1.0,
                denied: false,
            }
        }
    }

    impl MotionDevice for ScriptedDevice {
        fn open(&mut self) -> SeismoResult<()> {
            if self.denied {
                Err(SeismoError::sensor_unavailable("motion access denied"))
            } else {
                Ok(())
            }
        }

        fn read(&mut self) -> SeismoResult<Acceleration> {
            if let Some(next) = self.magnitudes.pop_front() {
                self.last = next;
            }
            Ok(Acceleration::new(0.0, 0.0, self.last))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    // Long interval: ticks only happen through poll_once()
    fn manual_config() -> EngineConfig {
        EngineConfig::default().with_interval(Duration::from_secs(3600))
    }

    fn engine_with(config: EngineConfig, magnitudes: &[f64]) -> Engine<PollingSensor<ScriptedDevice>> {
        Engine::new(config, PollingSensor::new(ScriptedDevice::new(magnitudes))).unwrap()
    }

    fn tick(engine: &Engine<PollingSensor<ScriptedDevice>>, times: usize) {
        for _ in 0..times {
            engine.sensor().poll_once();
        }
    }

    fn magnitudes(readings: &[ProcessedReading]) -> Vec<f64> {
        readings.iter().map(|r| r.magnitude).collect()
    }

    #[tokio::test]
    async fn test_pipeline_scenario() {
        let config = manual_config().with_smoothing_factor(0.5).with_history_capacity(3);
        let mut engine = engine_with(config, &[2.0, 4.0, 3.0, 4.0]);

        engine.start().unwrap();
        tick(&engine, 2);
        let smoothed: Vec<f64> = engine.history().iter().map(|r| r.smoothed_magnitude).collect();
        assert_eq!(smoothed, vec![2.0, 3.0]);

        tick(&engine, 2);
        assert_eq!(magnitudes(&engine.history()), vec![4.0, 3.0, 4.0]);
        assert_eq!(engine.latest().unwrap().magnitude, 4.0);
    }

    #[tokio::test]
    async fn test_start_twice_subscribes_once() {
        let mut engine = engine_with(manual_config(), &[1.0]);
        engine.start().unwrap();
        engine.start().unwrap();

        assert!(engine.is_running());
        assert_eq!(engine.sensor().subscriber_count(), 1);

        tick(&engine, 1);
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_start_preserves_history() {
        let mut engine = engine_with(manual_config(), &[1.0, 2.0, 3.0]);
        engine.start().unwrap();
        tick(&engine, 2);
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.sensor().subscriber_count(), 0);
        assert_eq!(engine.history().len(), 2);

        engine.start().unwrap();
        tick(&engine, 1);
        assert_eq!(magnitudes(&engine.history()), vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_reset_on_start_clears_history() {
        let mut engine = engine_with(manual_config().with_reset_on_start(true), &[1.0, 2.0, 5.0]);
        engine.start().unwrap();
        tick(&engine, 2);
        engine.stop();
        assert_eq!(engine.history().len(), 2);

        engine.start().unwrap();
        assert!(engine.history().is_empty());
        assert!(engine.latest().is_none());

        tick(&engine, 1);
        let first = engine.latest().unwrap();
        assert_eq!(first.smoothed_magnitude, 5.0);
    }

    #[tokio::test]
    async fn test_sensor_unavailable_leaves_engine_stopped() {
        let mut device = ScriptedDevice::new(&[1.0]);
        device.denied = true;
        let mut engine = Engine::new(manual_config(), PollingSensor::new(device)).unwrap();

        let err = engine.start().unwrap_err();
        assert!(err.is_sensor_unavailable());
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.sensor().subscriber_count(), 0);

        // Retry after the user grants access
        engine.sensor().with_device(|device| device.denied = false);
        engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.sensor().subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_halts_delivery() {
        let mut engine = engine_with(manual_config(), &[1.0, 2.0]);
        engine.stop();

        let delivered = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&delivered);
        engine.on_reading(move |_| *counter.lock() += 1);

        engine.start().unwrap();
        tick(&engine, 1);
        engine.stop();
        engine.stop();
        tick(&engine, 3);

        assert_eq!(*delivered.lock(), 1);
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_reading_subscribers_in_order() {
        let mut engine = engine_with(manual_config(), &[2.0, 4.0]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        let id = engine.on_reading(move |r| first.lock().push(("needle", r.magnitude)));
        let second = Arc::clone(&seen);
        engine.on_reading(move |r| second.lock().push(("graph", r.magnitude)));

        engine.start().unwrap();
        tick(&engine, 1);
        assert!(engine.remove_reading_subscriber(id));
        tick(&engine, 1);

        assert_eq!(
            *seen.lock(),
            vec![("needle", 2.0), ("graph", 2.0), ("graph", 4.0)]
        );
    }

    #[tokio::test]
    async fn test_subscriber_reads_history_during_delivery() {
        let mut engine = engine_with(manual_config().with_history_capacity(2), &[2.0, 4.0, 6.0]);
        let view = engine.view();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = engine.on_reading(move |reading| {
            let history = view.history();
            let latest = view.latest();
            sink.lock().push((reading.magnitude, magnitudes(&history), latest));
        });

        engine.start().unwrap();
        tick(&engine, 3);
        engine.remove_reading_subscriber(id);

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        for (magnitude, history, latest) in seen.iter() {
            assert_eq!(history.last(), Some(magnitude));
            assert_eq!(latest.map(|r| r.magnitude), Some(*magnitude));
        }
        assert_eq!(seen[2].1, vec![4.0, 6.0]);
    }

    #[tokio::test]
    async fn test_reset_reseeds_smoothing() {
        let config = manual_config().with_smoothing_factor(0.5);
        let mut engine = engine_with(config, &[2.0, 4.0, 10.0]);
        engine.start().unwrap();
        tick(&engine, 2);

        engine.reset();
        assert!(engine.history().is_empty());

        tick(&engine, 1);
        assert_eq!(engine.latest().unwrap().smoothed_magnitude, 10.0);
    }

    #[tokio::test]
    async fn test_set_smoothing_factor() {
        let mut engine = engine_with(manual_config().with_smoothing_factor(0.5), &[2.0, 4.0]);
        assert!(engine.set_smoothing_factor(0.0).is_err());
        engine.set_smoothing_factor(1.0).unwrap();
        assert_eq!(engine.config().smoothing_factor, 1.0);

        engine.start().unwrap();
        tick(&engine, 2);
        assert_eq!(engine.latest().unwrap().smoothed_magnitude, 4.0);
        assert_eq!(engine.stats().smoothing_factor, 1.0);
    }

    #[tokio::test]
    async fn test_stats_track_sessions() {
        let mut engine = engine_with(manual_config().with_smoothing_factor(1.0), &[1.0, 3.0, 2.0]);
        assert!(engine.stats().session_id.is_none());

        engine.start().unwrap();
        tick(&engine, 3);
        let stats = engine.stats();
        assert_eq!(stats.state, EngineState::Running);
        assert_eq!(stats.readings_processed, 3);
        assert_eq!(stats.peak_smoothed_magnitude, Some(3.0));
        assert_eq!(stats.history_len, 3);
        let first_session = stats.session_id.unwrap();

        engine.stop();
        engine.start().unwrap();
        let stats = engine.stats();
        assert_ne!(stats.session_id, Some(first_session));
        assert_eq!(stats.readings_processed, 0);
        assert!(stats.session_started_at.is_some());
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let sensor = PollingSensor::new(ScriptedDevice::new(&[]));
        let result = Engine::new(EngineConfig::default().with_smoothing_factor(1.5), sensor);
        assert!(matches!(result, Err(SeismoError::InvalidConfiguration { .. })));

        let sensor = PollingSensor::new(ScriptedDevice::new(&[]));
        assert!(Engine::new(EngineConfig::default().with_history_capacity(0), sensor).is_err());

        let sensor = PollingSensor::new(ScriptedDevice::new(&[]));
        assert!(Engine::new(EngineConfig::default().with_interval(Duration::ZERO), sensor).is_err());
    }

    #[tokio::test]
    async fn test_timer_driven_session() {
        let config = EngineConfig::default()
            .with_interval(Duration::from_millis(5))
            .with_history_capacity(1000);
        let mut engine = engine_with(config, &[]);

        let notified = Arc::new(Mutex::new(0u64));
        let counter = Arc::clone(&notified);
        engine.on_reading(move |_| *counter.lock() += 1);

        engine.start().unwrap();
        sleep(Duration::from_millis(100)).await;
        engine.stop();

        let stats = engine.stats();
        assert!(stats.readings_processed >= 3, "got {}", stats.readings_processed);
        assert_eq!(*notified.lock(), stats.readings_processed);
        assert_eq!(engine.history().len() as u64, stats.readings_processed);
    }
}
