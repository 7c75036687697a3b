//! Exponential retry intervals

use std::time::Duration;

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Exponentially growing interval, capped at a maximum
///
/// Has no notion of elapsed time; the caller owns the deadline.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            multiplier,
            max,
        }
    }

    /// Interval to wait before the next attempt
    pub fn next_interval(&mut self) -> Duration {
        let interval = self.current;
        self.current = self.current.mul_f64(self.multiplier).min(self.max);
        interval
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_MAX_INTERVAL)
    }
}
