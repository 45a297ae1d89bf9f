//! Blocking sleepers with cooperative interruption
//!
//! A [`Sleeper`] blocks the calling thread for a backoff delay. The
//! [`InterruptibleSleeper`] can be woken early from any thread through its
//! [`Interrupter`] handle, in which case the sleep fails with
//! [`Interrupted`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::debug;

use crate::error::CommonError;

/// A blocking sleep was cut short by an interrupt request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sleep of {requested:?} interrupted after {elapsed:?}")]
pub struct Interrupted {
    /// The duration the caller asked to sleep for
    pub requested: Duration,
    /// How long the caller actually slept before the interrupt was observed
    pub elapsed: Duration,
}

impl From<Interrupted> for CommonError {
    fn from(err: Interrupted) -> Self {
        CommonError::interrupted_with_reason("sleep", err.to_string())
    }
}

/// Blocks the current thread for a duration
///
/// Implementations must be shareable across threads: one sleeper may serve
/// many concurrent retry invocations.
pub trait Sleeper: Send + Sync {
    /// Block for `duration`, or fail early if the sleep was interrupted
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;
}

/// Plain `std::thread::sleep`. Never interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Signal {
    interrupted: Mutex<bool>,
    wake: Condvar,
}

/// A sleeper that can be interrupted from another thread
///
/// Once an interrupt is observed the flag stays raised, so every later
/// sleep fails immediately until [`Interrupter::reset`] is called.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rebound_common::time::{InterruptibleSleeper, Sleeper};
///
/// let sleeper = InterruptibleSleeper::new();
/// let interrupter = sleeper.interrupter();
///
/// interrupter.interrupt();
/// assert!(sleeper.sleep(Duration::from_secs(60)).is_err());
///
/// interrupter.reset();
/// assert!(sleeper.sleep(Duration::from_millis(1)).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptibleSleeper {
    signal: Arc<Signal>,
}

impl InterruptibleSleeper {
    /// Create a new sleeper with the interrupt flag lowered
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle that can interrupt this sleeper from any thread
    pub fn interrupter(&self) -> Interrupter {
        Interrupter { signal: Arc::clone(&self.signal) }
    }

    /// Check whether the interrupt flag is raised
    pub fn is_interrupted(&self) -> bool {
        *self.signal.interrupted.lock()
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let start = Instant::now();
        // `None` means the deadline overflows `Instant`: wait for an interrupt only.
        let deadline = start.checked_add(duration);
        let mut interrupted = self.signal.interrupted.lock();

        loop {
            if *interrupted {
                let elapsed = start.elapsed();
                debug!(requested = ?duration, elapsed = ?elapsed, "Sleep interrupted");
                return Err(Interrupted { requested: duration, elapsed });
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(());
                    }
                    self.signal.wake.wait_until(&mut interrupted, deadline);
                }
                None => self.signal.wake.wait(&mut interrupted),
            }
        }
    }
}

/// Handle used to interrupt an [`InterruptibleSleeper`]
#[derive(Debug, Clone)]
pub struct Interrupter {
    signal: Arc<Signal>,
}

impl Interrupter {
    /// Raise the interrupt flag and wake every thread blocked in `sleep`
    pub fn interrupt(&self) {
        let mut interrupted = self.signal.interrupted.lock();
        *interrupted = true;
        self.signal.wake.notify_all();
    }

    /// Lower the interrupt flag so later sleeps run to completion again
    pub fn reset(&self) {
        *self.signal.interrupted.lock() = false;
    }

    /// Check whether the interrupt flag is raised
    pub fn is_interrupted(&self) -> bool {
        *self.signal.interrupted.lock()
    }
}
