//! Wall-clock source for log timestamps.
use chrono::Utc;

/// Supplies the millisecond timestamp stamped on every log entry.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Reads the host clock through chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Frozen clock for deterministic runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
