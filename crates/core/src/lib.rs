//! # Rebound Core
//!
//! Blocking retry execution with pluggable backoff.
//!
//! This crate contains:
//! - [`RetryPolicy`]: a reusable, thread-safe retry configuration and the
//!   attempt loop behind `run`, `call` and `call_with_outcome`
//! - Backoff strategies: [`Fixed`], [`Exponential`], [`Randomized`] and any
//!   `Fn(u32, Duration) -> Duration` closure
//! - [`Failure`]: the kind tag the engine classifies failures by
//! - [`RetryConfig`]: file and environment configuration
//!
//! ## Architecture Principles
//! - Only depends on `rebound-common` for errors and sleepers
//! - Operation failures never cross the boundary; only interruption and
//!   configuration errors do
//! - Sleeping goes through the `Sleeper` trait, so tests never wait
//!
//! ## Example
//!
//! ```rust
//! use std::io;
//! use std::time::Duration;
//!
//! use rebound_core::{Exponential, RetryPolicy};
//!
//! let policy = RetryPolicy::<io::Error>::with_max_attempts(4)?
//!     .backoff(Exponential::with_factor(2)?)
//!     .delay(Duration::from_millis(1))
//!     .max_delay(Duration::from_millis(5))
//!     .handle(io::ErrorKind::ConnectionRefused)
//!     .abort_if(io::ErrorKind::PermissionDenied)
//!     .on_failure(|e| eprintln!("attempt failed: {e}"));
//!
//! let outcome = policy.call_with_outcome(|| {
//!     Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionRefused, "down"))
//! })?;
//!
//! assert!(outcome.is_exhausted());
//! assert_eq!(outcome.attempts, 4);
//! # Ok::<(), rebound_core::RetryError>(())
//! ```

pub mod backoff;
pub mod config;
pub mod constants;
pub mod error;
pub mod failure;
pub mod outcome;
pub mod policy;

pub use backoff::{BackoffStrategy, Exponential, Fixed, Randomized};
pub use config::{BackoffConfig, RetryConfig};
pub use error::{RetryError, RetryResult};
pub use failure::Failure;
pub use outcome::RetryOutcome;
pub use policy::{FailureObserver, RetryPolicy};
// Re-export sleepers so callers need not depend on rebound-common directly
pub use rebound_common::time::{InterruptibleSleeper, Interrupter, Sleeper, ThreadSleeper};
