//! Backoff strategies for computing the delay between attempts
//!
//! A strategy is a function of the attempt number and the policy's base
//! delay. `attempt` is 1-based: attempt 1 is the delay after the first
//! failure, before the second try. Arithmetic truncates to whole
//! milliseconds.
//!
//! Three stock strategies are provided:
//!
//! | Strategy | Delay |
//! |----------|-------|
//! | [`Fixed`] | `base` |
//! | [`Exponential`] | `base * factor^attempt` |
//! | [`Randomized`] | `base * attempt * r1 / r2`, `r1`, `r2` drawn from the OS RNG |
//!
//! Any `Fn(u32, Duration) -> Duration + Send + Sync` closure is also a
//! strategy.

use std::fmt;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;

use crate::constants::{DEFAULT_EXPONENTIAL_FACTOR, MIN_BACKOFF_PARAMETER};
use crate::error::{RetryError, RetryResult};

/// Computes the delay before the next attempt
pub trait BackoffStrategy: Send + Sync {
    /// Delay to wait after failed attempt `attempt` (1-based), given the
    /// policy's base delay
    fn delay(&self, attempt: u32, base: Duration) -> Duration;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> BackoffStrategy for F
where
    F: Fn(u32, Duration) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32, base: Duration) -> Duration {
        self(attempt, base)
    }
}

impl fmt::Debug for dyn BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackoffStrategy({})", self.name())
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn check_parameter(field: &str, value: u32) -> RetryResult<()> {
    if value < MIN_BACKOFF_PARAMETER {
        return Err(RetryError::invalid_config(
            field,
            format!("must be at least {MIN_BACKOFF_PARAMETER}, got {value}"),
        ));
    }
    Ok(())
}

/// Same delay before every attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fixed;

impl BackoffStrategy for Fixed {
    fn delay(&self, _attempt: u32, base: Duration) -> Duration {
        base
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Delay grows as `base * factor^attempt`
///
/// The exponent is the attempt number itself, so the first backoff is
/// already `base * factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exponential {
    factor: u32,
}

impl Default for Exponential {
    fn default() -> Self {
        Self { factor: DEFAULT_EXPONENTIAL_FACTOR }
    }
}

impl Exponential {
    /// Exponential backoff with the default factor of 3
    pub fn new() -> Self {
        Self::default()
    }

    /// Exponential backoff with a custom factor
    ///
    /// # Errors
    /// Returns an invalid-configuration error if `factor < 1`.
    pub fn with_factor(factor: u32) -> RetryResult<Self> {
        check_parameter("factor", factor)?;
        Ok(Self { factor })
    }

    /// The growth factor
    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl BackoffStrategy for Exponential {
    fn delay(&self, attempt: u32, base: Duration) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let rate = f64::from(self.factor).powi(exponent);
        // Float-to-int casts truncate toward zero and saturate at u64::MAX.
        let millis = (rate * whole_millis(base) as f64) as u64;
        Duration::from_millis(millis)
    }

    fn name(&self) -> &'static str {
        "exponential"
    }
}

/// Delay scaled linearly by attempt and perturbed by two nested random draws
///
/// Draws `r1` uniformly from `1..=bound` and `r2` from `1..=bound + r1`,
/// then returns `base * attempt * r1 / r2`. The result lies between
/// `base * attempt / (bound + 1)` and `base * attempt * bound`; combine with
/// a max delay for a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Randomized {
    bound: u32,
}

impl Randomized {
    /// Randomized backoff with the given jitter bound
    ///
    /// # Errors
    /// Returns an invalid-configuration error if `bound < 1`.
    pub fn new(bound: u32) -> RetryResult<Self> {
        check_parameter("bound", bound)?;
        Ok(Self { bound })
    }

    /// The jitter bound
    pub fn bound(&self) -> u32 {
        self.bound
    }
}

impl BackoffStrategy for Randomized {
    fn delay(&self, attempt: u32, base: Duration) -> Duration {
        let bound = u64::from(self.bound);
        let mut rng = OsRng;
        let r1 = rng.gen_range(0..bound) + 1;
        let r2 = rng.gen_range(0..bound + r1) + 1;

        let millis =
            whole_millis(base).saturating_mul(u64::from(attempt)).saturating_mul(r1) / r2;
        Duration::from_millis(millis)
    }

    fn name(&self) -> &'static str {
        "randomized"
    }
}
