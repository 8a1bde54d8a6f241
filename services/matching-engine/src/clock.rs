//! Monotonic timekeeping
//!
//! Event timestamps come from a process-epoch clock that can never move
//! backwards: the wall-clock epoch is read once at initialization and
//! all later readings add an `Instant` delta. Sequence numbers, not
//! timestamps, remain authoritative for ordering.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Monotonic clock producing Unix-nanosecond timestamps
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch_nanos: i64,
    started: Instant,
}

impl MonotonicClock {
    /// Initialize from the current wall clock
    pub fn new() -> Self {
        let epoch_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Self {
            epoch_nanos,
            started: Instant::now(),
        }
    }

    /// Current time in Unix nanoseconds; never decreases
    pub fn now_nanos(&self) -> i64 {
        self.epoch_nanos + self.started.elapsed().as_nanos() as i64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
