//! Test tracing setup
//!
//! Installs a `tracing-subscriber` formatter that writes through the test
//! harness, filtered by `RUST_LOG` (default `debug`). Safe to call from every
//! test: only the first call installs the subscriber.

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber once per process
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // A second init fails because a global subscriber already exists; that's fine.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}
