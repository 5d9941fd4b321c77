//! Monotonic timestamps for motion samples
//!
//! Samples are stamped relative to a clock origin captured when the clock is
//! created, so timestamps are non-decreasing regardless of wall-clock jumps.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Monotonic timestamp with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Timestamp {
    /// Nanoseconds since the clock origin
    nanos: u64,
}

impl Timestamp {
    /// Clock origin
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self { nanos: micros.saturating_mul(1_000) }
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self { nanos: millis.saturating_mul(1_000_000) }
    }

    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Fractional seconds since the clock origin
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Time elapsed since an earlier timestamp, or `None` if `earlier` is later
    pub fn checked_duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.nanos.checked_sub(earlier.nanos).map(Duration::from_nanos)
    }

    /// Timestamp shifted forward, saturating at the representable maximum
    pub fn saturating_add(&self, duration: Duration) -> Timestamp {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Timestamp::from_nanos(self.nanos.saturating_add(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.nanos / 1_000_000_000;
        let subsec_nanos = self.nanos % 1_000_000_000;
        write!(f, "{}.{:09}s", secs, subsec_nanos)
    }
}

/// Source of monotonic timestamps
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock whose origin is now
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Current time relative to the origin
    pub fn now(&self) -> Timestamp {
        let elapsed = self.origin.elapsed().as_nanos();
        Timestamp::from_nanos(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.as_nanos(), 1_500_000_000);
        assert_eq!(ts.as_millis(), 1_500);
        assert_eq!(ts.as_secs_f64(), 1.5);
        assert_eq!(ts.to_string(), "1.500000000s");
    }

    #[test]
    fn test_duration_since() {
        let t1 = Timestamp::from_millis(100);
        let t2 = Timestamp::from_millis(110);
        assert_eq!(t2.checked_duration_since(t1), Some(Duration::from_millis(10)));
        assert_eq!(t1.checked_duration_since(t2), None);
        assert_eq!(t1.saturating_add(Duration::from_millis(10)), t2);
    }

    #[test]
    fn test_conversions_saturate() {
        assert_eq!(Timestamp::from_millis(u64::MAX).as_nanos(), u64::MAX);
        assert_eq!(Timestamp::from_micros(u64::MAX / 10).as_nanos(), u64::MAX);
        assert_eq!(Timestamp::from_micros(7).as_nanos(), 7_000);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(1));
        let second = clock.now();
        assert!(second > first);
    }
}
