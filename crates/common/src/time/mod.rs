//! Time utilities for blocking retry loops
//!
//! - **[`sleeper`]**: the [`Sleeper`] abstraction, the plain
//!   [`ThreadSleeper`] and the [`InterruptibleSleeper`] with its
//!   [`Interrupter`] handle
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rebound_common::time::{Sleeper, ThreadSleeper};
//!
//! ThreadSleeper.sleep(Duration::from_millis(1)).unwrap();
//! ```

pub mod sleeper;

pub use sleeper::{Interrupted, InterruptibleSleeper, Interrupter, Sleeper, ThreadSleeper};
