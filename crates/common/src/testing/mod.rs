//! Testing utilities and helpers
//!
//! - **[`time`]**: [`MockSleeper`] records backoff delays instead of blocking
//! - **[`tracing`](mod@self::tracing)**: [`init_test_tracing`] installs a
//!   subscriber that writes through the test harness
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rebound_common::testing::{init_test_tracing, MockSleeper};
//! use rebound_common::time::Sleeper;
//!
//! init_test_tracing();
//! let sleeper = MockSleeper::new();
//! sleeper.sleep(Duration::from_secs(3)).unwrap();
//! assert_eq!(sleeper.count(), 1);
//! ```

pub mod time;
pub mod tracing;

pub use self::time::MockSleeper;
pub use self::tracing::init_test_tracing;
