//! Bounded retry for probe-and-act operations against UI the core does not own.
//!
//! A probe performs its action when it can and reports whether it did. The task
//! calls it immediately, then once per interval, until it succeeds, the attempt
//! budget runs out, or the task is cancelled. Running out is not an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancellation switch. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts }
            | RetryOutcome::Exhausted { attempts }
            | RetryOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }
}

#[derive(Debug)]
pub struct RetryTask {
    attempt_count: u32,
    max_attempts: u32,
    interval: Duration,
    cancel: CancelFlag,
}

impl RetryTask {
    pub fn new(max_attempts: u32, interval: Duration, cancel: CancelFlag) -> Self {
        Self {
            attempt_count: 0,
            max_attempts,
            interval,
            cancel,
        }
    }

    /// Consumes the task; a finished task cannot be restarted.
    pub async fn run<F>(mut self, mut probe: F) -> RetryOutcome
    where
        F: FnMut() -> bool,
    {
        loop {
            if self.cancel.is_cancelled() {
                return RetryOutcome::Cancelled {
                    attempts: self.attempt_count,
                };
            }
            if self.attempt_count >= self.max_attempts {
                return RetryOutcome::Exhausted {
                    attempts: self.attempt_count,
                };
            }
            self.attempt_count += 1;
            if probe() {
                return RetryOutcome::Succeeded {
                    attempts: self.attempt_count,
                };
            }
            if self.attempt_count < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
    }
}

/// Sleeps for `delay` and reports whether the caller should still go ahead.
pub async fn sleep_unless_cancelled(delay: Duration, cancel: &CancelFlag) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::time::sleep(delay).await;
    !cancel.is_cancelled()
}
