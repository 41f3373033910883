//! Claim sets this crate knows how to read.
//!
//! Only the claims needed to derive a token key, or to recognize a
//! back-channel logout token, are modelled. Unknown claims are ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compact::CompactToken;
use crate::error::{TokenError, TokenResult};

/// Member of the `events` claim that marks a back-channel logout token.
pub const BACKCHANNEL_LOGOUT_EVENT: &str = "http://schemas.openid.net/event/backchannel-logout";

/// One or several session identifiers.
///
/// Back-channel logout carries a single `sid`; some providers send an array
/// when a logout ends several sessions of the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionIds {
    /// Single session.
    Single(String),
    /// Several sessions.
    Multiple(Vec<String>),
}

impl SessionIds {
    /// Returns the session identifiers, skipping blank ones.
    #[must_use]
    pub fn as_vec(&self) -> Vec<&str> {
        let ids: Vec<&str> = match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multiple(v) => v.iter().map(String::as_str).collect(),
        };
        ids.into_iter().filter(|s| !s.trim().is_empty()).collect()
    }
}

/// Claims of a back-channel logout token.
///
/// Required claims are optional here so that a structurally valid token with
/// missing claims can be told apart from an undecodable one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutTokenClaims {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Session identifier(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionIds>,

    /// Identifier of the logout token itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issued at (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Event map; must contain [`BACKCHANNEL_LOGOUT_EVENT`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<HashMap<String, Value>>,

    /// Prohibited in logout tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Value>,
}

impl LogoutTokenClaims {
    /// Decodes the logout claims of `token`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Encoding`] or [`TokenError::Payload`] if the payload is
    ///   not a base64url JSON object.
    /// - [`TokenError::Claim`] if the payload is an object but `iss`, `sub`,
    ///   `sid`, `jti`, `iat` or `events` has the wrong type.
    pub fn decode(token: &CompactToken<'_>) -> TokenResult<Self> {
        let object: Map<String, Value> = token.claims()?;
        serde_json::from_value(Value::Object(object)).map_err(|e| TokenError::Claim(e.to_string()))
    }

    /// Returns whether the `events` claim carries the back-channel logout
    /// event as a JSON object.
    #[must_use]
    pub fn has_logout_event(&self) -> bool {
        self.events
            .as_ref()
            .and_then(|events| events.get(BACKCHANNEL_LOGOUT_EVENT))
            .is_some_and(Value::is_object)
    }

    /// Returns the session identifiers carried by the token.
    #[must_use]
    pub fn session_ids(&self) -> Vec<&str> {
        self.sid.as_ref().map(SessionIds::as_vec).unwrap_or_default()
    }
}

/// Claims read from an access token presented to the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Session identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Token identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}
