#![forbid(unsafe_code)]

//! Host-driven debounce and throttle timers.
//!
//! There is no background timer. The host passes its monotonic time into
//! [`Debouncer::schedule`] and [`Debouncer::poll`]; a deadline fires on the
//! first poll at or after it. This keeps every timing decision deterministic
//! under test.
//!
//! | Policy                  | On re-schedule while pending |
//! |-------------------------|------------------------------|
//! | [`DebouncePolicy::Trailing`] | deadline moves to `now + delay` |
//! | [`DebouncePolicy::Throttle`] | deadline is kept             |
//!
//! A trailing debouncer fires once after activity stops. A throttle fires at
//! most once per `delay` while activity continues.

use std::time::Duration;

/// How re-scheduling interacts with a pending deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePolicy {
    Trailing,
    Throttle,
}

/// Single pending deadline in host time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    policy: DebouncePolicy,
    deadline: Option<Duration>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration, policy: DebouncePolicy) -> Self {
        Self {
            delay,
            policy,
            deadline: None,
        }
    }

    #[must_use]
    pub const fn trailing(delay: Duration) -> Self {
        Self::new(delay, DebouncePolicy::Trailing)
    }

    #[must_use]
    pub const fn throttle(delay: Duration) -> Self {
        Self::new(delay, DebouncePolicy::Throttle)
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Request a firing at `now + delay` (subject to the policy).
    pub fn schedule(&mut self, now: Duration) {
        let next = now.saturating_add(self.delay);
        self.deadline = match (self.policy, self.deadline) {
            (DebouncePolicy::Throttle, Some(pending)) => Some(pending),
            _ => Some(next),
        };
    }

    /// Returns `true` exactly once when the pending deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
