//! Token decoding errors.

use thiserror::Error;

/// Errors raised while decoding a compact token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not three non-empty dot-separated segments.
    #[error("token must have three non-empty segments, found {0}")]
    Structure(usize),

    /// A segment is not valid base64url.
    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    /// The payload is not the expected JSON object.
    #[error("token payload is not a valid claims object: {0}")]
    Payload(String),

    /// The payload is a JSON object but a known claim has the wrong type.
    #[error("token claim has an unexpected type: {0}")]
    Claim(String),
}

/// Result type for token decoding.
pub type TokenResult<T> = Result<T, TokenError>;
