//! Fixed-capacity reading history with FIFO eviction

use seismo_core::ProcessedReading;
use std::collections::VecDeque;

/// Ring buffer of processed readings, oldest first
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    readings: VecDeque<ProcessedReading>,
}

impl HistoryBuffer {
    /// `capacity` must be non-zero; the processor validates it before construction
    pub fn new(capacity: usize) -> Self {
        HistoryBuffer {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, returning the evicted oldest one when full
    pub fn push(&mut self, reading: ProcessedReading) -> Option<ProcessedReading> {
        let evicted = if self.readings.len() == self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    pub fn latest(&self) -> Option<ProcessedReading> {
        self.readings.back().copied()
    }

    /// Copy of the buffer contents, oldest first
    pub fn snapshot(&self) -> Vec<ProcessedReading> {
        self.readings.iter().copied().collect()
    }

    /// The most recent `count` readings, oldest first
    pub fn tail(&self, count: usize) -> Vec<ProcessedReading> {
        let skip = self.readings.len().saturating_sub(count);
        self.readings.iter().skip(skip).copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedReading> {
        self.readings.iter()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seismo_core::Timestamp;

    fn reading(value: f64) -> ProcessedReading {
        ProcessedReading {
            timestamp: Timestamp::from_millis(value as u64),
            magnitude: value,
            smoothed_magnitude: value,
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = HistoryBuffer::new(3);
        assert!(history.push(reading(1.0)).is_none());
        assert!(history.push(reading(2.0)).is_none());
        assert!(history.push(reading(3.0)).is_none());

        let evicted = history.push(reading(4.0)).unwrap();
        assert_eq!(evicted.magnitude, 1.0);

        let values: Vec<f64> = history.snapshot().iter().map(|r| r.magnitude).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.len(), history.capacity());
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut history = HistoryBuffer::new(5);
        for i in 0..100 {
            history.push(reading(i as f64));
            assert!(history.len() <= 5);
        }
        assert_eq!(history.latest().unwrap().magnitude, 99.0);
        assert_eq!(history.iter().next().unwrap().magnitude, 95.0);
    }

    #[test]
    fn test_tail() {
        let mut history = HistoryBuffer::new(10);
        for i in 0..4 {
            history.push(reading(i as f64));
        }
        let values: Vec<f64> = history.tail(2).iter().map(|r| r.magnitude).collect();
        assert_eq!(values, vec![2.0, 3.0]);
        assert_eq!(history.tail(50).len(), 4);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut history = HistoryBuffer::new(2);
        history.push(reading(1.0));
        let snapshot = history.snapshot();
        history.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
