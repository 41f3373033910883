//! Compact serialization (`header.payload.signature`).

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::de::DeserializeOwned;

use crate::error::{TokenError, TokenResult};

/// A token split into its three compact segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactToken<'a> {
    /// Encoded header segment.
    pub header: &'a str,
    /// Encoded payload segment.
    pub payload: &'a str,
    /// Encoded signature segment.
    pub signature: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Splits `token` into its segments.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Structure`] unless the token is exactly three
    /// non-empty segments.
    pub fn parse(token: &'a str) -> TokenResult<Self> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        match segments.as_slice() {
            [header, payload, signature]
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    header: *header,
                    payload: *payload,
                    signature: *signature,
                })
            }
            _ => Err(TokenError::Structure(segments.len())),
        }
    }

    /// Decodes the payload segment into raw bytes.
    ///
    /// Trailing `=` padding is tolerated even though compact serialization
    /// omits it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if the segment is not base64url.
    pub fn payload_bytes(&self) -> TokenResult<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(self.payload.trim_end_matches('='))
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Decodes the payload segment into claims of type `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not base64url or does not
    /// deserialize into `T`.
    pub fn claims<T: DeserializeOwned>(&self) -> TokenResult<T> {
        let bytes = self.payload_bytes()?;
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
    }
}

/// Parses `token` and decodes its payload into `T`.
///
/// # Errors
///
/// Returns an error if the token is structurally invalid or its payload does
/// not decode into `T`.
pub fn decode_claims<T: DeserializeOwned>(token: &str) -> TokenResult<T> {
    CompactToken::parse(token)?.claims()
}
