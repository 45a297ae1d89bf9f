//! Sleep mocking for deterministic tests
//!
//! [`MockSleeper`] records every requested delay instead of blocking, so
//! retry tests can assert the exact backoff schedule without waiting for it.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use rebound_common::testing::MockSleeper;
//! use rebound_common::time::Sleeper;
//!
//! let sleeper = MockSleeper::new();
//! sleeper.sleep(Duration::from_secs(5)).unwrap();
//! sleeper.sleep(Duration::from_secs(7)).unwrap();
//!
//! assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(5), Duration::from_secs(7)]);
//! assert_eq!(sleeper.total(), Duration::from_secs(12));
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::time::{Interrupted, Sleeper};

#[derive(Debug, Default)]
struct Recorded {
    sleeps: Vec<Duration>,
    interrupt_at: Option<usize>,
}

/// Mock sleeper that records delays without blocking
///
/// Clones share the same recording, so a clone can be handed to the code
/// under test while the original is kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockSleeper {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockSleeper {
    /// Create a new mock sleeper that never interrupts
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call to `sleep` (1-based) with [`Interrupted`]
    ///
    /// The interrupted call is still recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use rebound_common::testing::MockSleeper;
    /// use rebound_common::time::Sleeper;
    ///
    /// let sleeper = MockSleeper::new().interrupt_at(2);
    /// assert!(sleeper.sleep(Duration::from_secs(1)).is_ok());
    /// assert!(sleeper.sleep(Duration::from_secs(1)).is_err());
    /// ```
    #[must_use]
    pub fn interrupt_at(self, n: usize) -> Self {
        self.recorded.lock().interrupt_at = Some(n);
        self
    }

    /// Every delay requested so far, in call order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.recorded.lock().sleeps.clone()
    }

    /// Number of `sleep` calls so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.recorded.lock().sleeps.len()
    }

    /// Sum of every requested delay
    #[must_use]
    pub fn total(&self) -> Duration {
        self.recorded.lock().sleeps.iter().sum()
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let mut recorded = self.recorded.lock();
        recorded.sleeps.push(duration);

        if recorded.interrupt_at == Some(recorded.sleeps.len()) {
            return Err(Interrupted { requested: duration, elapsed: Duration::ZERO });
        }
        Ok(())
    }
}
