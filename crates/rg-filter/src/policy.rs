//! Behavior when the revocation store is unreachable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a store failure translates into a verdict.
///
/// `FailClosed` keeps revoked sessions out during an outage at the price of
/// rejecting every authenticated request; `FailOpen` keeps traffic flowing
/// but lets revoked sessions through until the store is back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Allow the request when the store cannot answer.
    FailOpen,
    /// Deny the request when the store cannot answer.
    #[default]
    FailClosed,
}

impl FailurePolicy {
    /// Returns the configuration spelling of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailOpen => "fail-open",
            Self::FailClosed => "fail-closed",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown failure policy name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown failure policy '{0}', expected 'fail-open' or 'fail-closed'")]
pub struct PolicyParseError(pub String);

impl FromStr for FailurePolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-open" | "open" => Ok(Self::FailOpen),
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}
