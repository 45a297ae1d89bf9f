// Constants for the retry engine
use std::time::Duration;

/// Default maximum number of attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay handed to the backoff strategy
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Default multiplier for exponential backoff
pub const DEFAULT_EXPONENTIAL_FACTOR: u32 = 3;

/// Minimum allowed max_attempts value
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Minimum allowed exponential factor and randomized jitter bound
pub const MIN_BACKOFF_PARAMETER: u32 = 1;
