//! Revocation store error types.

use std::time::Duration;

use thiserror::Error;

/// Revocation store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or dropped the connection.
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),

    /// A backend call did not complete within its deadline.
    #[error("revocation store call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend configuration is invalid.
    #[error("revocation store configuration error: {0}")]
    Configuration(String),

    /// Unexpected backend failure.
    #[error("internal revocation store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Returns whether this error is an availability failure.
    ///
    /// Availability failures are what the request filter's failure policy
    /// applies to.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result type for revocation store operations.
pub type StoreResult<T> = Result<T, StoreError>;
