//! Delays used to line up with the widget's unobservable render timing.

#[cfg(test)]
#[path = "timing_test.rs"]
mod timing_test;

use std::time::Duration;

/// Viewport width below which the navigation drawer is treated as a mobile overlay.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

/// Delays between the chained steps of each sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Injection: flag raised, then wait before resolving the input.
    pub settle: Duration,
    /// Injection: value written, then wait before activating submit.
    pub submit: Duration,
    /// Injection: submit activated, then wait before clearing the flag.
    pub release: Duration,
    /// New conversation: wait before showing recommendations again.
    pub reset: Duration,
    /// New conversation: wait before dismissing the mobile navigation.
    pub nav_dismiss: Duration,
    /// Wait before attaching input listeners after a visibility change.
    pub input_monitor: Duration,
    /// Overlay mount attempts after a change that may require mounting.
    pub mount: RetrySchedule,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            submit: Duration::from_millis(300),
            release: Duration::from_millis(100),
            reset: Duration::from_millis(100),
            nav_dismiss: Duration::from_millis(200),
            input_monitor: Duration::from_millis(500),
            mount: RetrySchedule::default(),
        }
    }
}

/// Bounded retry with multiplicative backoff.
///
/// Delays are measured from the triggering change, not from the previous
/// attempt, so `first = 500ms, factor = 2, attempts = 2` yields 500ms and 1000ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    pub first: Duration,
    pub factor: u32,
    pub attempts: u32,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self { first: Duration::from_millis(500), factor: 2, attempts: 2 }
    }
}

impl RetrySchedule {
    /// Offsets of every attempt from the triggering change.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        let mut out = Vec::new();
        let mut next = self.first;
        for _ in 0..self.attempts {
            out.push(next);
            next = next.saturating_mul(self.factor.max(1));
        }
        out
    }
}
