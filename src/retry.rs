//! Attempt budget and exponential backoff shared by every failure class.

use std::time::Duration;

/// How many calls to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of calls, counting the first.
    pub max_attempts: u32,
    /// Delay before the second call.
    pub base_delay: Duration,
    /// Upper bound on the doubled delay. `None` lets it grow freely.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// Fresh per-call state.
    pub fn start(&self) -> RetryState {
        RetryState {
            attempt: 0,
            delay: self.base_delay,
            max_attempts: self.max_attempts,
            max_delay: self.max_delay,
        }
    }
}

/// Per-call retry bookkeeping. Never shared between calls.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    delay: Duration,
    max_attempts: u32,
    max_delay: Option<Duration>,
}

impl RetryState {
    /// Calls made so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether another call may be issued.
    pub fn has_budget(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Record a failed call.
    ///
    /// Returns the wait before the next call, or `None` once the budget is
    /// spent. The delay doubles on every returned wait.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if !self.has_budget() {
            return None;
        }

        let wait = self.delay;
        let next = self.delay.saturating_mul(2);
        self.delay = match self.max_delay {
            Some(max) => next.min(max),
            None => next,
        };
        Some(wait)
    }
}
