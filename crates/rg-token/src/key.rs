//! Token key derivation.

use std::fmt;

use crate::claims::{AccessTokenClaims, LogoutTokenClaims};

/// Identifier under which a revocation is stored and looked up.
///
/// Derived from the session identifier when the token carries one, else from
/// the subject.
///
/// Keys are compared verbatim and never widened: a logout that carries only
/// a subject revokes the subject key, and an access token that carries a
/// `sid` is looked up under its session key only. Such a logout therefore
/// does not reach access tokens bound to a session, which identity providers
/// commonly issue. Providers must send `sid` in logout tokens for
/// session-bound access tokens to be denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey(String);

impl TokenKey {
    /// Derives the key from a session identifier and a subject.
    ///
    /// Blank values count as absent. Returns `None` when neither is usable.
    #[must_use]
    pub fn derive(sid: Option<&str>, sub: Option<&str>) -> Option<Self> {
        non_blank(sid)
            .or_else(|| non_blank(sub))
            .map(|value| Self(value.to_string()))
    }

    /// Derives the keys to revoke for a logout token.
    ///
    /// One key per session identifier; the subject when there is none. A
    /// subject key only matches access tokens without a `sid`.
    #[must_use]
    pub fn for_logout(claims: &LogoutTokenClaims) -> Vec<Self> {
        let sessions = claims.session_ids();
        if sessions.is_empty() {
            Self::derive(None, claims.sub.as_deref())
                .into_iter()
                .collect()
        } else {
            sessions
                .into_iter()
                .filter_map(|sid| Self::derive(Some(sid), None))
                .collect()
        }
    }

    /// Derives the key to look up for an access token.
    #[must_use]
    pub fn for_access_token(claims: &AccessTokenClaims) -> Option<Self> {
        Self::derive(claims.sid.as_deref(), claims.sub.as_deref())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TokenKey> for String {
    fn from(key: TokenKey) -> Self {
        key.0
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
