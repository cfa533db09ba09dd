#![forbid(unsafe_code)]

//! Host-driven monotonic clock.

use std::time::Duration;

/// Deterministic clock advanced by the host.
///
/// The engine never reads wall time; every timed entry point takes the
/// host's monotonic `now` and records it here. Time never runs backwards:
/// an earlier `now` than the last one seen is ignored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Record the host's current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}
