// Outcome of a retry invocation with summary statistics
use std::time::Duration;

/// What a retry invocation ended with
///
/// `run` and `call` reduce this to `()` and `Option<T>`; use
/// [`RetryPolicy::call_with_outcome`](crate::RetryPolicy::call_with_outcome)
/// to keep the failure an abort or exhaustion would otherwise swallow.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// The produced value, if an attempt succeeded
    pub value: Option<T>,
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// Sum of every backoff delay slept
    pub total_delay: Duration,
    /// Whether the loop stopped on an abort-registered failure
    pub aborted: bool,
    /// The most recent failure: the abort failure, the final failure of an
    /// exhausted loop, or the last one recovered from before a success
    pub last_failure: Option<E>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Whether an attempt produced a value
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// Whether every attempt failed without an abort
    pub fn is_exhausted(&self) -> bool {
        self.value.is_none() && !self.aborted
    }

    /// Consume the outcome and return only the value
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Get the average delay between attempts (excludes operation execution
    /// time).
    pub fn average_delay(&self) -> Duration {
        if self.attempts <= 1 {
            return Duration::ZERO;
        }
        self.total_delay / (self.attempts - 1)
    }
}
