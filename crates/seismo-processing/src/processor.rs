//! Sample-to-reading signal processor

use crate::history::HistoryBuffer;
use crate::smoothing::ExponentialSmoother;
use seismo_core::{config_error, EngineConfig, ProcessedReading, Sample, SeismoResult};

/// Turns raw samples into smoothed magnitudes and keeps a bounded history
#[derive(Debug, Clone)]
pub struct SignalProcessor {
    smoother: ExponentialSmoother,
    history: HistoryBuffer,
}

impl SignalProcessor {
    /// Create a processor; rejects α outside (0, 1] and a zero capacity
    pub fn new(smoothing_factor: f64, history_capacity: usize) -> SeismoResult<Self> {
        if history_capacity == 0 {
            return Err(config_error!("history capacity must be greater than 0"));
        }
        let smoother = ExponentialSmoother::new(smoothing_factor)?;

        Ok(SignalProcessor {
            smoother,
            history: HistoryBuffer::new(history_capacity),
        })
    }

    pub fn from_config(config: &EngineConfig) -> SeismoResult<Self> {
        Self::new(config.smoothing_factor, config.history_capacity)
    }

    /// Process one sample: magnitude, EMA update, append to history.
    /// Samples with non-finite axes are rejected and leave the state untouched.
    pub fn ingest(&mut self, sample: &Sample) -> SeismoResult<ProcessedReading> {
        sample.validate()?;

        let magnitude = sample.magnitude();
        let smoothed_magnitude = self.smoother.update(magnitude);

        let reading = ProcessedReading {
            timestamp: sample.timestamp(),
            magnitude,
            smoothed_magnitude,
        };
        self.history.push(reading);

        Ok(reading)
    }

    /// Most recent reading, if any sample was ingested since the last reset
    pub fn latest(&self) -> Option<ProcessedReading> {
        self.history.latest()
    }

    /// Snapshot of the history, oldest first
    pub fn history(&self) -> Vec<ProcessedReading> {
        self.history.snapshot()
    }

    /// The most recent `count` readings, oldest first
    pub fn recent(&self, count: usize) -> Vec<ProcessedReading> {
        self.history.tail(count)
    }

    /// Clear history and smoothing state
    pub fn reset(&mut self) {
        self.history.clear();
        self.smoother.reset();
    }

    /// Adjust sensitivity; smoothing continues from the current value
    pub fn set_smoothing_factor(&mut self, alpha: f64) -> SeismoResult<()> {
        self.smoother.set_alpha(alpha)
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.smoother.alpha()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }
}
