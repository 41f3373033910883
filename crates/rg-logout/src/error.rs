//! Logout ingestion errors.

use rg_store::StoreError;
use rg_token::TokenError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a logout notification is not accepted.
#[derive(Debug, Error)]
pub enum LogoutError {
    /// The logout token is structurally invalid.
    #[error("malformed logout token: {0}")]
    Malformed(String),

    /// The logout token is well formed but lacks required semantics.
    #[error("unsupported logout token: {0}")]
    Unsupported(String),

    /// The revocation could not be written.
    #[error("revocation not recorded: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl LogoutError {
    /// Returns the error code reported to the identity provider.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "invalid_request",
            Self::Unsupported(_) => "unsupported_logout_token",
            Self::StoreUnavailable(_) => "temporarily_unavailable",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// 400 is not worth retrying; 501 means the provider sent something this
    /// gateway does not handle; 503 is transient.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Malformed(_) => 400,
            Self::Unsupported(_) => 501,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Creates the JSON error body.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
        }
    }
}

impl From<TokenError> for LogoutError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Claim(_) => Self::Unsupported(err.to_string()),
            TokenError::Structure(_) | TokenError::Encoding(_) | TokenError::Payload(_) => {
                Self::Malformed(err.to_string())
            }
        }
    }
}

/// Error body returned to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Result type for logout ingestion.
pub type LogoutResult<T> = Result<T, LogoutError>;
