//! Time sources consulted by the adapter.

use crate::types::Timestamp;

/// Monotonic time source for frame post times and rate statistics.
///
/// The adapter reads the clock on the ingress thread (post times) and on the
/// worker (repeat emission times, rate samples); implementations must be
/// cheap and thread-safe.
pub trait Clock: Send + Sync + 'static {
    /// Current time with microsecond resolution.
    fn now(&self) -> Timestamp;

    /// Current time in milliseconds, for rate statistics.
    fn now_ms(&self) -> i64 {
        self.now().as_millis()
    }
}

/// Clock backed by the tokio time driver.
///
/// Under a paused runtime (`tokio::time::pause`) this follows virtual time,
/// which keeps the cadence timing tests deterministic. Outside a test-util
/// runtime it reads the ordinary monotonic clock.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    /// Clock reporting time elapsed since this call.
    pub fn new() -> Self {
        Self { origin: tokio::time::Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.origin.elapsed().as_micros() as i64)
    }
}
