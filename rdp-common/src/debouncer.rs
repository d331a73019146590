//! Quiet-period timer for coalescing bursts of events.
//!
//! Call [`Debouncer::trigger`] whenever the event of interest occurs and
//! [`Debouncer::poll`] once per UI iteration. After a full quiet period with
//! no further triggers, the callback fires exactly once.

use std::time::{Duration, Instant};

type Callback = Box<dyn FnMut() + Send>;

/// Timer-based debouncer.
///
/// The deadline is cleared *before* the callback runs, so a callback that
/// re-triggers starts a fresh cycle rather than a re-entrant one.
pub struct Debouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
    callback: Option<Callback>,
}

impl Debouncer {
    /// Create a debouncer with no callback; [`poll`](Self::poll) still
    /// reports firing through its return value.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
            callback: None,
        }
    }

    /// Create a debouncer that invokes `callback` when the quiet period
    /// elapses.
    pub fn with_callback<F>(quiet_period: Duration, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            quiet_period,
            deadline: None,
            callback: Some(Box::new(callback)),
        }
    }

    /// Reset the deadline to now + quiet period.
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Reset the deadline relative to an explicit `now` (deterministic tests).
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Fire the callback if the deadline has passed. Returns true if fired.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// [`poll`](Self::poll) against an explicit `now`.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                // Clear first: a callback that calls trigger() must begin a
                // new cycle instead of being swallowed.
                self.deadline = None;
                if let Some(cb) = self.callback.as_mut() {
                    cb();
                }
                true
            }
            _ => false,
        }
    }

    /// Clear the deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True if a trigger is waiting for its quiet period to elapse.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
