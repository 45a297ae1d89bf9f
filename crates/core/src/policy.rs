//! Retry policy: fluent configuration and the attempt loop
//!
//! A [`RetryPolicy`] is assembled once through its builder methods and then
//! invoked any number of times. Every invocation runs its own attempt loop;
//! nothing but the configuration is shared between invocations, so one
//! policy can serve many threads at once.
//!
//! # Failure handling
//!
//! For each failed attempt the engine:
//! 1. stops immediately, silently, if the failure's kind is in the abort set
//!    (observers are not notified);
//! 2. notifies every observer, in registration order;
//! 3. sleeps for the backoff delay if more attempts remain and the handled
//!    set is empty or contains the kind.
//!
//! The handled set only gates the sleep. A failure whose kind is not handled
//! is still retried, just without waiting first.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rebound_core::backoff::Fixed;
//! use rebound_core::RetryPolicy;
//!
//! let policy = RetryPolicy::<std::io::Error>::new()
//!     .backoff(Fixed)
//!     .delay(Duration::from_millis(1))
//!     .handle(std::io::ErrorKind::TimedOut);
//!
//! let mut calls = 0;
//! let value = policy
//!     .call(|| {
//!         calls += 1;
//!         if calls < 2 {
//!             Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"))
//!         } else {
//!             Ok("ready")
//!         }
//!     })
//!     .unwrap();
//!
//! assert_eq!(value, Some("ready"));
//! assert_eq!(calls, 2);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rebound_common::time::{Sleeper, ThreadSleeper};
use tracing::{debug, instrument, warn};

use crate::backoff::BackoffStrategy;
use crate::constants::{DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS, MIN_MAX_ATTEMPTS};
use crate::error::{RetryError, RetryResult};
use crate::failure::Failure;
use crate::outcome::RetryOutcome;

/// Callback notified of every non-aborting failure
pub type FailureObserver<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Declarative retry policy
pub struct RetryPolicy<E: Failure> {
    max_attempts: u32,
    delay: Duration,
    max_delay: Option<Duration>,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    handled: HashSet<E::Kind>,
    aborts: HashSet<E::Kind>,
    observers: Vec<FailureObserver<E>>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E: Failure> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            delay: self.delay,
            max_delay: self.max_delay,
            backoff: self.backoff.clone(),
            handled: self.handled.clone(),
            aborts: self.aborts.clone(),
            observers: self.observers.clone(),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<E: Failure> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("max_delay", &self.max_delay)
            .field("backoff", &self.backoff)
            .field("handled", &self.handled)
            .field("aborts", &self.aborts)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<E: Failure> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Failure> RetryPolicy<E> {
    /// Policy with 3 attempts and a 3 second base delay
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
            max_delay: None,
            backoff: None,
            handled: HashSet::new(),
            aborts: HashSet::new(),
            observers: Vec::new(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Policy with an explicit number of attempts (including the first)
    ///
    /// # Errors
    /// Returns an invalid-configuration error if `max_attempts` is 0.
    pub fn with_max_attempts(max_attempts: u32) -> RetryResult<Self> {
        if max_attempts < MIN_MAX_ATTEMPTS {
            return Err(RetryError::invalid_config(
                "max_attempts",
                format!("must be at least {MIN_MAX_ATTEMPTS}, got {max_attempts}"),
            ));
        }
        Ok(Self { max_attempts, ..Self::new() })
    }

    /// Set the backoff strategy
    pub fn backoff<B>(mut self, strategy: B) -> Self
    where
        B: BackoffStrategy + 'static,
    {
        self.backoff = Some(Arc::new(strategy));
        self
    }

    /// Set a backoff strategy that is already shared
    pub fn shared_backoff(mut self, strategy: Arc<dyn BackoffStrategy>) -> Self {
        self.backoff = Some(strategy);
        self
    }

    /// Set the base delay handed to the backoff strategy
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cap every computed backoff delay
    ///
    /// Caps are whole milliseconds: one shorter than 1ms is ignored.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Add a failure kind eligible for a backoff sleep
    pub fn handle(mut self, kind: E::Kind) -> Self {
        self.handled.insert(kind);
        self
    }

    /// Add several failure kinds eligible for a backoff sleep
    pub fn handle_all<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        self.handled.extend(kinds);
        self
    }

    /// Add a failure kind that stops the loop immediately
    pub fn abort_if(mut self, kind: E::Kind) -> Self {
        self.aborts.insert(kind);
        self
    }

    /// Add several failure kinds that stop the loop immediately
    pub fn abort_if_all<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        self.aborts.extend(kinds);
        self
    }

    /// Register an observer notified of every non-aborting failure
    ///
    /// Observers run synchronously, in registration order, before the
    /// backoff sleep. A panicking observer unwinds through the invocation.
    pub fn on_failure<F>(mut self, observer: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Replace the sleeper used between attempts
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay handed to the backoff strategy
    pub fn base_delay(&self) -> Duration {
        self.delay
    }

    /// Cap applied to computed delays, if any
    pub fn max_delay_cap(&self) -> Option<Duration> {
        self.max_delay
    }

    fn sleeps_after(&self, kind: &E::Kind) -> bool {
        self.handled.is_empty() || self.handled.contains(kind)
    }

    fn backoff_delay(&self, attempt: u32) -> RetryResult<Duration> {
        let strategy = self.backoff.as_ref().ok_or(RetryError::MissingBackoff)?;
        let delay = strategy.delay(attempt, self.delay);

        Ok(match self.max_delay {
            Some(cap) if cap.as_millis() > 0 => delay.min(cap),
            _ => delay,
        })
    }
}

impl<E> RetryPolicy<E>
where
    E: Failure + fmt::Debug,
{
    /// Run an effect until it succeeds, aborts or runs out of attempts
    ///
    /// Returns `Ok(())` in all three cases: an exhausted or aborted run is
    /// indistinguishable from a successful one. Use
    /// [`call_with_outcome`](Self::call_with_outcome) to tell them apart.
    ///
    /// # Errors
    /// - [`RetryError::Interrupted`] if a backoff sleep was interrupted
    /// - [`RetryError::MissingBackoff`] if a sleep was needed but no
    ///   strategy is configured
    #[instrument(skip(self, operation), fields(max_attempts = self.max_attempts))]
    pub fn run<F>(&self, operation: F) -> RetryResult<()>
    where
        F: FnMut() -> Result<(), E>,
    {
        self.execute(operation).map(|_| ())
    }

    /// Compute a value, returning `Some` on the first success
    ///
    /// Returns `Ok(None)` when the loop aborts or every attempt fails.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    #[instrument(skip(self, operation), fields(max_attempts = self.max_attempts))]
    pub fn call<T, F>(&self, operation: F) -> RetryResult<Option<T>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute(operation).map(RetryOutcome::into_value)
    }

    /// Same loop as [`call`](Self::call), reporting attempts, delays and the
    /// failure that ended the loop
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    #[instrument(skip(self, operation), fields(max_attempts = self.max_attempts))]
    pub fn call_with_outcome<T, F>(&self, operation: F) -> RetryResult<RetryOutcome<T, E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute(operation)
    }

    fn execute<T, F>(&self, mut operation: F) -> RetryResult<RetryOutcome<T, E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut total_delay = Duration::ZERO;
        let mut last_failure = None;

        for attempt in 1..=self.max_attempts {
            debug!("Executing operation (attempt {}/{})", attempt, self.max_attempts);

            let failure = match operation() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} failed attempts", attempt - 1);
                    }
                    return Ok(RetryOutcome {
                        value: Some(value),
                        attempts: attempt,
                        total_delay,
                        aborted: false,
                        last_failure,
                    });
                }
                Err(failure) => failure,
            };

            let kind = failure.kind();
            if self.aborts.contains(&kind) {
                debug!(attempt, ?kind, "Abort-registered failure, stopping without retry");
                return Ok(RetryOutcome {
                    value: None,
                    attempts: attempt,
                    total_delay,
                    aborted: true,
                    last_failure: Some(failure),
                });
            }

            for observer in &self.observers {
                observer(&failure);
            }

            if attempt < self.max_attempts {
                if self.sleeps_after(&kind) {
                    let delay = self.backoff_delay(attempt)?;
                    warn!(attempt, ?kind, "Operation failed, retrying after {:?}", delay);

                    self.sleeper.sleep(delay).map_err(|source| {
                        let err = RetryError::Interrupted { next_attempt: attempt + 1, source };
                        warn!(
                            attempt,
                            fields = ?err.as_tracing_fields(),
                            "Backoff sleep interrupted, abandoning retries"
                        );
                        err
                    })?;
                    total_delay = total_delay.saturating_add(delay);
                } else {
                    debug!(attempt, ?kind, "Failure kind not handled, retrying without backoff");
                }
            }

            last_failure = Some(failure);
        }

        warn!(
            "All retry attempts exhausted after {} tries, last failure: {:?}",
            self.max_attempts, last_failure
        );
        Ok(RetryOutcome {
            value: None,
            attempts: self.max_attempts,
            total_delay,
            aborted: false,
            last_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the retry policy
    //!
    //! Tests cover attempt counting, abort and handled-set classification,
    //! observer ordering, max-delay capping, interruption and the outcome
    //! report. Sleeps go through `MockSleeper`, so no test waits.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use rebound_common::testing::MockSleeper;

    use super::*;
    use crate::backoff::{Exponential, Fixed};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestError {
        IllegalArgument(&'static str),
        IllegalState(&'static str),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestErrorKind {
        IllegalArgument,
        IllegalState,
    }

    crate::impl_failure_kind!(TestError => TestErrorKind {
        Self::IllegalArgument(_) => IllegalArgument,
        Self::IllegalState(_) => IllegalState,
    });

    fn policy(max_attempts: u32, sleeper: &MockSleeper) -> RetryPolicy<TestError> {
        RetryPolicy::with_max_attempts(max_attempts)
            .expect("valid attempt count")
            .sleeper(sleeper.clone())
    }

    /// Validates that an always-failing operation runs exactly
    /// `max_attempts` times.
    ///
    /// Assertions:
    /// - Confirms the invocation count equals `n` for `n` in 1..=5.
    /// - Confirms `n - 1` backoff sleeps were requested.
    #[test]
    fn test_always_failing_runs_max_attempts() {
        for n in 1..=5 {
            let sleeper = MockSleeper::new();
            let counter = AtomicU32::new(0);

            policy(n, &sleeper)
                .backoff(Fixed)
                .run(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::IllegalArgument("always"))
                })
                .expect("exhaustion is not an error");

            assert_eq!(counter.load(Ordering::SeqCst), n);
            assert_eq!(sleeper.count(), (n - 1) as usize);
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::<TestError>::new();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(3));
        assert_eq!(policy.max_delay_cap(), None);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = RetryPolicy::<TestError>::with_max_attempts(0).expect_err("0 is invalid");
        assert!(err.is_invalid_config());
    }

    /// Validates the first-attempt success path.
    ///
    /// Assertions:
    /// - Confirms the value comes back wrapped in `Some`.
    /// - Confirms no sleep and no observer notification happened.
    #[test]
    fn test_call_first_attempt_success() {
        let sleeper = MockSleeper::new();
        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = Arc::clone(&notified);

        let result = policy(1, &sleeper)
            .backoff(Exponential::with_factor(3).expect("valid factor"))
            .delay(Duration::from_secs(2))
            .on_failure(move |_| {
                notified_clone.fetch_add(1, Ordering::SeqCst);
            })
            .call(|| Ok::<_, TestError>("RESULT"))
            .expect("no interruption");

        assert_eq!(result, Some("RESULT"));
        assert_eq!(sleeper.count(), 0);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    /// Validates the fixed-backoff scenario with a handled kind.
    ///
    /// Assertions:
    /// - Confirms the operation ran 3 times.
    /// - Confirms the observer saw every failure.
    /// - Confirms two 2s sleeps (4s total) and none after the final attempt.
    #[test]
    fn test_fixed_retry_with_handled_kind() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);
        let observed = Arc::new(AtomicU32::new(0));
        let observed_clone = Arc::clone(&observed);

        let result = policy(3, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_secs(2))
            .handle(TestErrorKind::IllegalArgument)
            .on_failure(move |e| {
                if matches!(e, TestError::IllegalArgument(_)) {
                    observed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .run(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::IllegalArgument("Just to test"))
            });

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(observed.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2), Duration::from_secs(2)]);
        assert_eq!(sleeper.total(), Duration::from_secs(4));
    }

    #[test]
    fn test_multiple_handled_kinds() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        policy(3, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_secs(2))
            .handle_all([TestErrorKind::IllegalArgument, TestErrorKind::IllegalState])
            .run(|| match counter.fetch_add(1, Ordering::SeqCst) + 1 {
                1 => Err(TestError::IllegalArgument("Just to test")),
                _ => Err(TestError::IllegalState("Just to test")),
            })
            .expect("no interruption");

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.count(), 2);
    }

    /// A kind outside a non-empty handled set is still retried; only the
    /// sleep is skipped.
    #[test]
    fn test_unhandled_kind_retries_without_sleep() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        policy(4, &sleeper)
            .backoff(Fixed)
            .handle(TestErrorKind::IllegalState)
            .run(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::IllegalArgument("not handled"))
            })
            .expect("no interruption");

        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn test_abort_on_first_attempt() {
        let sleeper = MockSleeper::new();
        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = Arc::clone(&notified);

        let result = RetryPolicy::<TestError>::new()
            .sleeper(sleeper.clone())
            .abort_if(TestErrorKind::IllegalState)
            .on_failure(move |_| {
                notified_clone.fetch_add(1, Ordering::SeqCst);
            })
            .run(|| Err(TestError::IllegalState("Abort if")));

        assert!(result.is_ok());
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert_eq!(sleeper.count(), 0);
    }

    /// Validates that an abort-registered kind on attempt `k` stops the
    /// loop after exactly `k` invocations.
    ///
    /// Assertions:
    /// - Confirms the operation ran 3 times out of 5 allowed.
    /// - Confirms observers saw only the two non-aborting failures.
    #[test]
    fn test_abort_mid_loop() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);
        let observed = Arc::new(AtomicU32::new(0));
        let observed_clone = Arc::clone(&observed);

        policy(5, &sleeper)
            .backoff(Fixed)
            .abort_if_all([TestErrorKind::IllegalState])
            .on_failure(move |_| {
                observed_clone.fetch_add(1, Ordering::SeqCst);
            })
            .run(|| {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    return Err(TestError::IllegalState("Abort if"));
                }
                Err(TestError::IllegalArgument("Just to retry"))
            })
            .expect("abort is swallowed");

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(observed.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn test_call_abort_returns_none() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        let result: Option<u32> = policy(2, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_millis(500))
            .abort_if(TestErrorKind::IllegalState)
            .call(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::IllegalState("Just to test"))
            })
            .expect("abort is swallowed");

        assert_eq!(result, None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_call_exhausted_returns_none() {
        let sleeper = MockSleeper::new();
        let observed = Arc::new(AtomicU32::new(0));
        let observed_clone = Arc::clone(&observed);

        let result: Option<()> = RetryPolicy::<TestError>::new()
            .sleeper(sleeper.clone())
            .backoff(Fixed)
            .on_failure(move |e| {
                if matches!(e, TestError::IllegalArgument(_)) {
                    observed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .call(|| Err(TestError::IllegalArgument("Just to test")))
            .expect("exhaustion is not an error");

        assert_eq!(result, None);
        assert_eq!(observed.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(3), Duration::from_secs(3)]);
    }

    #[test]
    fn test_eventual_success_with_exponential_backoff() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        let result = policy(5, &sleeper)
            .backoff(Exponential::with_factor(2).expect("valid factor"))
            .delay(Duration::from_secs(3))
            .call(|| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::IllegalArgument("transient"))
                } else {
                    Ok(42)
                }
            })
            .expect("no interruption");

        assert_eq!(result, Some(42));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(6), Duration::from_secs(12)]);
    }

    /// Validates `max_delay` capping.
    ///
    /// Assertions:
    /// - Confirms delays above the cap are cut to exactly the cap.
    #[test]
    fn test_max_delay_caps_backoff() {
        let sleeper = MockSleeper::new();

        policy(3, &sleeper)
            .backoff(Exponential::with_factor(5).expect("valid factor"))
            .delay(Duration::from_secs(2))
            .max_delay(Duration::from_secs(3))
            .run(|| Err(TestError::IllegalState("")))
            .expect("no interruption");

        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(3), Duration::from_secs(3)]);
    }

    #[test]
    fn test_max_delay_keeps_smaller_delay() {
        let sleeper = MockSleeper::new();

        policy(2, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_secs(2))
            .max_delay(Duration::from_secs(30))
            .run(|| Err(TestError::IllegalState("")))
            .expect("no interruption");

        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn test_zero_max_delay_is_ignored() {
        let sleeper = MockSleeper::new();

        policy(2, &sleeper)
            .backoff(Exponential::new())
            .delay(Duration::from_secs(1))
            .max_delay(Duration::ZERO)
            .run(|| Err(TestError::IllegalState("")))
            .expect("no interruption");

        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(3)]);
    }

    /// Validates that caps below one millisecond are ignored.
    ///
    /// Assertions:
    /// - Confirms a 500µs cap leaves a 10ms fixed delay unchanged.
    /// - Confirms a 1ms cap still applies.
    #[test]
    fn test_sub_millisecond_max_delay_is_ignored() {
        let sleeper = MockSleeper::new();

        policy(2, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_millis(10))
            .max_delay(Duration::from_micros(500))
            .run(|| Err(TestError::IllegalState("")))
            .expect("no interruption");
        policy(2, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_millis(10))
            .max_delay(Duration::from_millis(1))
            .run(|| Err(TestError::IllegalState("")))
            .expect("no interruption");

        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(10), Duration::from_millis(1)]);
    }

    #[test]
    fn test_missing_backoff_reported_when_sleep_needed() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        let err = policy(2, &sleeper)
            .delay(Duration::from_secs(2))
            .run(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::IllegalState(""))
            })
            .expect_err("a sleep needs a strategy");

        assert!(matches!(err, RetryError::MissingBackoff));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_backoff_unused_without_sleep() {
        let sleeper = MockSleeper::new();

        // A single attempt never sleeps.
        assert!(policy(1, &sleeper).run(|| Err(TestError::IllegalState(""))).is_ok());
        // Neither does a success.
        assert_eq!(policy(3, &sleeper).call(|| Ok::<_, TestError>(1)).ok(), Some(Some(1)));
    }

    /// Validates that an interrupted backoff ends the invocation with the
    /// distinguished interrupted error.
    ///
    /// Assertions:
    /// - Confirms `RetryError::Interrupted` names attempt 2 as next.
    /// - Confirms the operation is not invoked again.
    #[test]
    fn test_interrupted_sleep_propagates() {
        let sleeper = MockSleeper::new().interrupt_at(1);
        let counter = AtomicU32::new(0);

        let err = policy(3, &sleeper)
            .backoff(Fixed)
            .call(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError::IllegalArgument("flaky"))
            })
            .expect_err("interruption crosses the boundary");

        assert!(matches!(err, RetryError::Interrupted { next_attempt: 2, .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let sleeper = MockSleeper::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (Arc::clone(&log), Arc::clone(&log));

        policy(2, &sleeper)
            .backoff(Fixed)
            .on_failure(move |_| first.lock().expect("mutex poisoned").push("first"))
            .on_failure(move |_| second.lock().expect("mutex poisoned").push("second"))
            .run(|| Err(TestError::IllegalArgument("")))
            .expect("no interruption");

        assert_eq!(
            *log.lock().expect("mutex poisoned"),
            vec!["first", "second", "first", "second"]
        );
    }

    #[test]
    #[should_panic(expected = "Got it!")]
    fn test_observer_panic_propagates() {
        let _ = RetryPolicy::<TestError>::new()
            .sleeper(MockSleeper::new())
            .backoff(Exponential::new())
            .delay(Duration::from_secs(2))
            .handle(TestErrorKind::IllegalState)
            .on_failure(|e| {
                if matches!(e, TestError::IllegalArgument(_)) {
                    panic!("Got it!");
                }
            })
            .call(|| Err::<(), _>(TestError::IllegalArgument("On Failure")));
    }

    #[test]
    fn test_outcome_reports_exhaustion() {
        let sleeper = MockSleeper::new();
        let counter = AtomicU32::new(0);

        let outcome = policy(3, &sleeper)
            .backoff(Fixed)
            .delay(Duration::from_secs(1))
            .call_with_outcome(|| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(if n < 2 {
                    TestError::IllegalArgument("early")
                } else {
                    TestError::IllegalState("final")
                })
            })
            .expect("no interruption");

        assert!(outcome.is_exhausted());
        assert!(!outcome.aborted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.total_delay, Duration::from_secs(2));
        assert_eq!(outcome.last_failure, Some(TestError::IllegalState("final")));
    }

    #[test]
    fn test_outcome_keeps_swallowed_abort() {
        let sleeper = MockSleeper::new();

        let outcome = policy(4, &sleeper)
            .backoff(Fixed)
            .abort_if(TestErrorKind::IllegalState)
            .call_with_outcome(|| Err::<(), _>(TestError::IllegalState("stop")))
            .expect("abort is swallowed");

        assert!(outcome.aborted);
        assert!(!outcome.is_exhausted());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.last_failure, Some(TestError::IllegalState("stop")));
    }

    /// Each invocation restarts its attempt counter, so the backoff
    /// schedule repeats instead of continuing.
    #[test]
    fn test_invocations_are_independent() {
        let sleeper = MockSleeper::new();
        let policy = policy(3, &sleeper)
            .backoff(Exponential::with_factor(2).expect("valid factor"))
            .delay(Duration::from_secs(1));

        for _ in 0..2 {
            policy.run(|| Err(TestError::IllegalArgument(""))).expect("no interruption");
        }

        let expected: Vec<Duration> = [2, 4, 2, 4].into_iter().map(Duration::from_secs).collect();
        assert_eq!(sleeper.sleeps(), expected);
    }

    #[test]
    fn test_concurrent_invocations_share_policy() {
        let sleeper = MockSleeper::new();
        let policy = policy(3, &sleeper).backoff(Fixed).delay(Duration::from_millis(10));
        let total = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let local = AtomicU32::new(0);
                    policy
                        .run(|| {
                            local.fetch_add(1, Ordering::SeqCst);
                            total.fetch_add(1, Ordering::SeqCst);
                            Err(TestError::IllegalArgument("busy"))
                        })
                        .expect("no interruption");
                    assert_eq!(local.load(Ordering::SeqCst), 3);
                });
            }
        });

        assert_eq!(total.load(Ordering::SeqCst), 12);
        assert_eq!(sleeper.count(), 8);
    }

    #[test]
    fn test_clone_keeps_configuration() {
        let original = MockSleeper::new();
        let replacement = MockSleeper::new();
        let policy = policy(2, &original).backoff(Fixed).delay(Duration::from_secs(5));

        let cloned = policy.clone().sleeper(replacement.clone());
        cloned.run(|| Err(TestError::IllegalArgument(""))).expect("no interruption");

        assert_eq!(cloned.max_attempts(), 2);
        assert_eq!(original.count(), 0);
        assert_eq!(replacement.sleeps(), vec![Duration::from_secs(5)]);
    }

    #[test]
    fn test_closure_backoff() {
        let sleeper = MockSleeper::new();

        policy(3, &sleeper)
            .backoff(|attempt: u32, base: Duration| base * attempt)
            .delay(Duration::from_millis(100))
            .run(|| Err(TestError::IllegalArgument("")))
            .expect("no interruption");

        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(100), Duration::from_millis(200)]);
    }
}
