//! Failure-kind classification
//!
//! The retry engine never inspects an operation's error beyond its
//! [`Failure::kind`] tag. Handled and abort sets hold kinds, and membership
//! is plain equality: a kind matches only itself. There is no hierarchy, so
//! registering one kind never implicitly covers another.
//!
//! Error enums usually get a parallel, fieldless kind enum. The
//! [`impl_failure_kind!`](crate::impl_failure_kind) macro writes the mapping:
//!
//! ```rust
//! use rebound_core::{impl_failure_kind, Failure};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Timeout,
//!     Refused { port: u16 },
//!     BadStatus(u16),
//! }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum FetchErrorKind {
//!     Timeout,
//!     Refused,
//!     BadStatus,
//! }
//!
//! impl_failure_kind!(FetchError => FetchErrorKind {
//!     Self::Timeout => Timeout,
//!     Self::Refused { .. } => Refused,
//!     Self::BadStatus(_) => BadStatus,
//! });
//!
//! assert_eq!(FetchError::BadStatus(503).kind(), FetchErrorKind::BadStatus);
//! ```

use std::fmt;
use std::hash::Hash;

/// An operation failure the retry engine can classify
pub trait Failure {
    /// Discrete classification tag compared by equality
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The kind of this failure
    fn kind(&self) -> Self::Kind;
}

impl Failure for std::io::Error {
    type Kind = std::io::ErrorKind;

    fn kind(&self) -> Self::Kind {
        std::io::Error::kind(self)
    }
}

/// Implements [`Failure`] by mapping match patterns to kind variants
///
/// # Arguments
///
/// * `$error` - The failure type
/// * `$kind` - The kind enum (must satisfy the `Failure::Kind` bounds)
/// * `$pattern => $variant` - One arm per pattern; arms are tried in order
#[macro_export]
macro_rules! impl_failure_kind {
    ($error:ty => $kind:ty { $($pattern:pat => $variant:ident),+ $(,)? }) => {
        impl $crate::Failure for $error {
            type Kind = $kind;

            fn kind(&self) -> Self::Kind {
                match self {
                    $($pattern => <$kind>::$variant,)+
                }
            }
        }
    };
}
