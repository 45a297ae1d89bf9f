//! Retry configuration loading
//!
//! Loads a [`RetryConfig`] from environment variables or files and turns it
//! into a [`RetryPolicy`]. Failure kinds and observers are not
//! configurable here; attach them to the built policy in code.
//!
//! ## Loading Strategy
//! 1. Read `REBOUND_*` environment variables; if any is set, use them
//! 2. Otherwise search the working directory for a config file
//! 3. Otherwise fall back to the defaults (3 attempts, 3s, no backoff)
//!
//! ## Environment Variables
//! - `REBOUND_MAX_ATTEMPTS`: attempts including the first
//! - `REBOUND_DELAY_MS`: base delay in milliseconds
//! - `REBOUND_MAX_DELAY_MS`: delay cap in milliseconds
//! - `REBOUND_BACKOFF`: `fixed`, `exponential`, `exponential:<factor>` or
//!   `randomized:<bound>`
//!
//! ## File Format
//! `rebound.toml` or `rebound.json`, detected by extension:
//!
//! ```toml
//! max_attempts = 5
//! delay = 200        # milliseconds
//! max_delay = 5000   # milliseconds
//!
//! [backoff]
//! kind = "exponential"
//! factor = 2
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rebound_common::error::CommonError;
use rebound_common::utils::serde::{duration_millis, option_duration_millis};
use serde::{Deserialize, Serialize};

use crate::backoff::{BackoffStrategy, Exponential, Fixed, Randomized};
use crate::constants::{
    DEFAULT_DELAY, DEFAULT_EXPONENTIAL_FACTOR, DEFAULT_MAX_ATTEMPTS, MIN_MAX_ATTEMPTS,
};
use crate::error::{RetryError, RetryResult};
use crate::failure::Failure;
use crate::policy::RetryPolicy;

/// Attempts including the first
pub const ENV_MAX_ATTEMPTS: &str = "REBOUND_MAX_ATTEMPTS";
/// Base delay in milliseconds
pub const ENV_DELAY_MS: &str = "REBOUND_DELAY_MS";
/// Delay cap in milliseconds
pub const ENV_MAX_DELAY_MS: &str = "REBOUND_MAX_DELAY_MS";
/// Backoff strategy and its parameter
pub const ENV_BACKOFF: &str = "REBOUND_BACKOFF";

const CONFIG_FILE_NAMES: [&str; 2] = ["rebound.toml", "rebound.json"];

fn default_factor() -> u32 {
    DEFAULT_EXPONENTIAL_FACTOR
}

/// Serializable choice of backoff strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    /// [`Fixed`] backoff
    Fixed,
    /// [`Exponential`] backoff; `factor` defaults to 3
    Exponential {
        #[serde(default = "default_factor")]
        factor: u32,
    },
    /// [`Randomized`] backoff
    Randomized { bound: u32 },
}

impl BackoffConfig {
    /// Build the strategy this configuration names
    ///
    /// # Errors
    /// Returns an invalid-configuration error if a factor or bound is 0.
    pub fn build(&self) -> RetryResult<Arc<dyn BackoffStrategy>> {
        Ok(match *self {
            Self::Fixed => Arc::new(Fixed),
            Self::Exponential { factor } => Arc::new(Exponential::with_factor(factor)?),
            Self::Randomized { bound } => Arc::new(Randomized::new(bound)?),
        })
    }
}

impl FromStr for BackoffConfig {
    type Err = RetryError;

    /// Parse the `REBOUND_BACKOFF` form: `fixed`, `exponential`,
    /// `exponential:<factor>` or `randomized:<bound>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| {
            RetryError::from(CommonError::validation_with_value(ENV_BACKOFF, message, s))
        };
        let parameter = |raw: &str| {
            raw.trim().parse::<u32>().map_err(|e| invalid(&format!("invalid parameter: {e}")))
        };

        let (kind, param) = match s.trim().split_once(':') {
            Some((kind, param)) => (kind.trim(), Some(param)),
            None => (s.trim(), None),
        };

        match (kind.to_ascii_lowercase().as_str(), param) {
            ("fixed", None) => Ok(Self::Fixed),
            ("exponential", None) => Ok(Self::Exponential { factor: DEFAULT_EXPONENTIAL_FACTOR }),
            ("exponential", Some(raw)) => Ok(Self::Exponential { factor: parameter(raw)? }),
            ("randomized", Some(raw)) => Ok(Self::Randomized { bound: parameter(raw)? }),
            ("randomized", None) => Err(invalid("randomized backoff needs a bound")),
            ("fixed", Some(_)) => Err(invalid("fixed backoff takes no parameter")),
            _ => Err(invalid("expected fixed, exponential[:factor] or randomized:<bound>")),
        }
    }
}

/// Retry settings that can live outside code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts including the first
    pub max_attempts: u32,
    /// Base delay, in milliseconds on the wire
    #[serde(with = "duration_millis")]
    pub delay: Duration,
    /// Optional delay cap, in milliseconds on the wire
    #[serde(with = "option_duration_millis", skip_serializing_if = "Option::is_none")]
    pub max_delay: Option<Duration>,
    /// Backoff strategy; required once any attempt has to sleep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffConfig>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
            max_delay: None,
            backoff: None,
        }
    }
}

impl RetryConfig {
    /// Check every field a policy would reject
    ///
    /// # Errors
    /// Returns an invalid-configuration error for 0 attempts or a backoff
    /// factor/bound below 1.
    pub fn validate(&self) -> RetryResult<()> {
        if self.max_attempts < MIN_MAX_ATTEMPTS {
            return Err(RetryError::invalid_config(
                "max_attempts",
                format!("must be at least {MIN_MAX_ATTEMPTS}, got {}", self.max_attempts),
            ));
        }
        if let Some(backoff) = &self.backoff {
            backoff.build()?;
        }
        Ok(())
    }

    /// Read settings through a variable lookup function
    ///
    /// Returns `Ok(None)` when none of the `REBOUND_*` variables is set.
    /// Variables that are not set keep their defaults.
    ///
    /// # Errors
    /// Returns a validation error naming the variable if a value does not
    /// parse.
    pub fn from_lookup<F>(lookup: F) -> RetryResult<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts = lookup(ENV_MAX_ATTEMPTS);
        let delay = lookup(ENV_DELAY_MS);
        let max_delay = lookup(ENV_MAX_DELAY_MS);
        let backoff = lookup(ENV_BACKOFF);

        if max_attempts.is_none() && delay.is_none() && max_delay.is_none() && backoff.is_none() {
            return Ok(None);
        }

        let mut config = Self::default();
        if let Some(raw) = max_attempts {
            config.max_attempts = parse_var(ENV_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = delay {
            config.delay = Duration::from_millis(parse_var(ENV_DELAY_MS, &raw)?);
        }
        if let Some(raw) = max_delay {
            config.max_delay = Some(Duration::from_millis(parse_var(ENV_MAX_DELAY_MS, &raw)?));
        }
        if let Some(raw) = backoff {
            config.backoff = Some(raw.parse()?);
        }

        config.validate()?;
        Ok(Some(config))
    }
}

fn parse_var<T>(name: &str, raw: &str) -> RetryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        CommonError::validation_with_value(name, format!("Invalid value: {e}"), raw).into()
    })
}

/// Load configuration with automatic fallback strategy
///
/// Environment variables win when any is set. Otherwise the working
/// directory is searched for `rebound.toml` / `rebound.json`. With neither,
/// the defaults are returned.
///
/// # Errors
/// Returns an error if a source exists but is malformed or invalid.
pub fn load() -> RetryResult<RetryConfig> {
    load_from_sources().inspect_err(|e| {
        tracing::warn!(
            fields = ?e.as_tracing_fields(),
            "Failed to load retry configuration: {}",
            e
        );
    })
}

fn load_from_sources() -> RetryResult<RetryConfig> {
    if let Some(config) = load_from_env()? {
        tracing::info!("Retry configuration loaded from environment variables");
        return Ok(config);
    }

    match find_config_path() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No retry configuration found, using defaults");
            Ok(RetryConfig::default())
        }
    }
}

/// Load configuration from the process environment
///
/// # Errors
/// See [`RetryConfig::from_lookup`].
pub fn load_from_env() -> RetryResult<Option<RetryConfig>> {
    RetryConfig::from_lookup(|name| std::env::var(name).ok())
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the working directory.
///
/// # Errors
/// Returns an error if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or unsupported
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> RetryResult<RetryConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RetryError::invalid_config(
                    "path",
                    format!("Config file not found: {}", p.display()),
                ));
            }
            p
        }
        None => find_config_path().ok_or_else(|| {
            RetryError::from(CommonError::config("No rebound config file in working directory"))
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading retry configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        CommonError::persistence_op("read_config", format!("{}: {e}", config_path.display()))
    })?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration content, detecting the format by file extension
fn parse_config(contents: &str, path: &Path) -> RetryResult<RetryConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CommonError::serialization_format("TOML", e.to_string()).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CommonError::serialization_format("JSON", e.to_string()).into()),
        _ => Err(RetryError::invalid_config(
            "path",
            format!("Unsupported config format: {extension}"),
        )),
    }
}

/// First config file found in the working directory
pub fn find_config_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_path_in(&cwd)
}

/// First config file found in `dir` (`rebound.toml` before `rebound.json`)
pub fn find_config_path_in(dir: &Path) -> Option<PathBuf> {
    let found = CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|p| p.is_file());
    if let Some(path) = &found {
        tracing::debug!(path = %path.display(), "Found retry config file");
    }
    found
}

impl<E: Failure> RetryPolicy<E> {
    /// Build a policy from loaded configuration
    ///
    /// # Errors
    /// Returns an invalid-configuration error if the configuration does not
    /// validate.
    pub fn from_config(config: &RetryConfig) -> RetryResult<Self> {
        config.validate()?;

        let mut policy = Self::with_max_attempts(config.max_attempts)?.delay(config.delay);
        if let Some(cap) = config.max_delay {
            policy = policy.max_delay(cap);
        }
        if let Some(backoff) = &config.backoff {
            policy = policy.shared_backoff(backoff.build()?);
        }
        Ok(policy)
    }
}
