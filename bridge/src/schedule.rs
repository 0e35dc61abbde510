//! Deferred callbacks.
//!
//! All coordination in the bridge is timer-chained on a single thread. A
//! [`Scheduler`] hands back a handle per task; dropping the handle cancels
//! the task if it has not run yet. [`TimeoutScheduler`] uses browser timers;
//! native tests drive the bridge with the virtual clock in `clock`.

use std::time::Duration;

use gloo_timers::callback::Timeout;

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Cancels the task when dropped.
    type Handle;

    fn schedule(&self, delay: Duration, task: Task) -> Self::Handle;
}

// =============================================================================
// BROWSER
// =============================================================================

/// `setTimeout`-backed scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    type Handle = Timeout;

    fn schedule(&self, delay: Duration, task: Task) -> Timeout {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, task)
    }
}
