//! Revocation verdicts for presented credentials.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rg_store::{RevocationStore, StoreError};
use rg_token::{AccessTokenClaims, TokenKey, decode_claims};

use crate::policy::FailurePolicy;

/// Default bound on a single store lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The credential's session or subject has been logged out.
    Revoked {
        /// Key the revocation was found under.
        token_key: String,
    },
    /// The store could not answer and the policy is fail-closed.
    StoreUnavailable(String),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revoked { .. } => f.write_str("token has been revoked"),
            Self::StoreUnavailable(_) => f.write_str("revocation status unavailable"),
        }
    }
}

/// Outcome of a revocation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the request.
    Allow,
    /// Reject the request as unauthorized.
    Deny(DenyReason),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the deny reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

/// Checks credentials against the revocation store.
///
/// Stateless apart from its configuration; one instance is shared by every
/// request.
pub struct RevocationFilter {
    store: Arc<dyn RevocationStore>,
    policy: FailurePolicy,
    lookup_timeout: Duration,
}

impl RevocationFilter {
    /// Creates a filter over `store` applying `policy` on store failures.
    #[must_use]
    pub fn new(store: Arc<dyn RevocationStore>, policy: FailurePolicy) -> Self {
        Self {
            store,
            policy,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Sets the bound on a single store lookup.
    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Returns the configured failure policy.
    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Derives the token key for a credential.
    ///
    /// Accepts a raw compact token or one prefixed with `Bearer `. Returns
    /// `None` when the payload cannot be decoded or carries neither `sid`
    /// nor `sub`.
    #[must_use]
    pub fn token_key(credential: &str) -> Option<TokenKey> {
        let token = strip_bearer(credential);
        let claims: AccessTokenClaims = decode_claims(token).ok()?;
        TokenKey::for_access_token(&claims)
    }

    /// Decides whether the request carrying `credential` may proceed.
    pub async fn check(&self, credential: &str) -> Verdict {
        let Some(key) = Self::token_key(credential) else {
            return Verdict::Allow;
        };

        match self.lookup(key.as_str()).await {
            Ok(false) => Verdict::Allow,
            Ok(true) => {
                tracing::debug!(token_key = %key, "denying revoked token");
                Verdict::Deny(DenyReason::Revoked {
                    token_key: key.into(),
                })
            }
            Err(e) => {
                tracing::warn!(
                    token_key = %key,
                    policy = %self.policy,
                    error = %e,
                    "revocation lookup failed"
                );
                match self.policy {
                    FailurePolicy::FailOpen => Verdict::Allow,
                    FailurePolicy::FailClosed => {
                        Verdict::Deny(DenyReason::StoreUnavailable(e.to_string()))
                    }
                }
            }
        }
    }

    async fn lookup(&self, key: &str) -> Result<bool, StoreError> {
        tokio::time::timeout(self.lookup_timeout, self.store.is_revoked(key))
            .await
            .map_err(|_| StoreError::Timeout(self.lookup_timeout))?
    }
}

impl fmt::Debug for RevocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationFilter")
            .field("backend", &self.store.backend())
            .field("policy", &self.policy)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

fn strip_bearer(credential: &str) -> &str {
    let credential = credential.trim();
    match credential.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => credential,
    }
}
