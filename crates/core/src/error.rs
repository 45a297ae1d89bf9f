// Error types for the retry engine
use rebound_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use rebound_common::time::Interrupted;
use thiserror::Error;

/// Errors that cross the retry engine's boundary
///
/// Operation failures never appear here: the engine absorbs them. Only the
/// interruption of a backoff sleep and configuration problems reach the
/// caller.
#[derive(Debug, Error)]
pub enum RetryError {
    // Config, validation, serialization, persistence and interruption errors
    #[error(transparent)]
    Common(#[from] CommonError),

    /// The backoff sleep before `next_attempt` was interrupted
    #[error("Retry interrupted while backing off before attempt {next_attempt}")]
    Interrupted {
        next_attempt: u32,
        #[source]
        source: Interrupted,
    },

    /// An attempt failed and needed a backoff delay, but no strategy was set
    #[error("No backoff strategy configured; one is required once an attempt fails")]
    MissingBackoff,
}

impl RetryError {
    /// Create an invalid-configuration error for a named parameter
    pub fn invalid_config<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Self::Common(CommonError::config_field(field, message))
    }

    /// Whether this is the distinguished retry-interrupted failure
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Whether this error reports invalid configuration
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::MissingBackoff | Self::Common(CommonError::Config { .. }))
    }

    /// Structured logging fields, led by `error_type`
    pub fn as_tracing_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Common(e) => e.as_tracing_fields(),
            Self::Interrupted { next_attempt, source } => vec![
                ("error_type", "interrupted".to_string()),
                ("next_attempt", next_attempt.to_string()),
                ("reason", source.to_string()),
            ],
            Self::MissingBackoff => {
                vec![("error_type", "config".to_string()), ("field", "backoff".to_string())]
            }
        }
    }
}

impl ErrorClassification for RetryError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Common(e) => e.is_retryable(),
            // Interruption is a request to stop; bad config stays bad.
            Self::Interrupted { .. } | Self::MissingBackoff => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Common(e) => e.severity(),
            Self::Interrupted { .. } => ErrorSeverity::Warning,
            Self::MissingBackoff => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Common(e) => e.is_critical(),
            _ => false,
        }
    }
}

// Manual implementation of From<RetryError> for CommonError for cross-crate
// errors
impl From<RetryError> for CommonError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Common(e) => e,
            RetryError::Interrupted { next_attempt, source } => CommonError::interrupted_with_reason(
                format!("retry before attempt {next_attempt}"),
                source.to_string(),
            ),
            RetryError::MissingBackoff => {
                CommonError::config_field("backoff", "no backoff strategy configured")
            }
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T> = Result<T, RetryError>;
