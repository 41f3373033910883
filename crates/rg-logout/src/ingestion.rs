//! Logout notification processing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rg_store::{Clock, RevocationEntry, RevocationStore, StoreError, SystemClock};
use rg_token::{CompactToken, LogoutTokenClaims, TokenKey};

use crate::error::{LogoutError, LogoutResult};

/// Default bound on each store write.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// A decoded logout notification and the revocations it calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutNotification {
    /// Issuer of the logout token.
    pub issuer: String,
    /// Subject that logged out.
    pub subject: String,
    /// Identifier of the logout token, when present.
    pub token_id: Option<String>,
    /// One entry per session, or one for the subject.
    pub entries: Vec<RevocationEntry>,
}

/// Turns logout tokens into revocations.
#[derive(Clone)]
pub struct LogoutIngestion {
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
    revocation_ttl: TimeDelta,
    write_timeout: Duration,
}

impl LogoutIngestion {
    /// Creates an ingestion revoking keys for `revocation_ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn RevocationStore>, revocation_ttl: TimeDelta) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            revocation_ttl,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Uses `clock` to compute expiries.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bounds each store write by `timeout`.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Returns the TTL applied to new revocations.
    #[must_use]
    pub const fn revocation_ttl(&self) -> TimeDelta {
        self.revocation_ttl
    }

    /// Decodes and checks a logout token without touching the store.
    ///
    /// # Errors
    ///
    /// - [`LogoutError::Malformed`] if the token is not three non-empty
    ///   segments or its payload is not a JSON object.
    /// - [`LogoutError::Unsupported`] if `iss`, `sub` or the back-channel
    ///   logout event is missing or has the wrong type, or a `nonce` is
    ///   present.
    pub fn parse(&self, logout_token: &str) -> LogoutResult<LogoutNotification> {
        let claims = LogoutTokenClaims::decode(&CompactToken::parse(logout_token)?)?;

        let issuer = required(claims.iss.as_deref(), "iss")?;
        let subject = required(claims.sub.as_deref(), "sub")?;
        if !claims.has_logout_event() {
            return Err(LogoutError::Unsupported(
                "events claim does not carry a back-channel logout event".to_string(),
            ));
        }
        if claims.nonce.is_some() {
            return Err(LogoutError::Unsupported(
                "logout tokens must not carry a nonce".to_string(),
            ));
        }

        // A TTL beyond the representable range revokes until the end of time.
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.revocation_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entries = TokenKey::for_logout(&claims)
            .into_iter()
            .map(|key| RevocationEntry::new(key, expires_at))
            .collect();

        Ok(LogoutNotification {
            issuer: issuer.to_string(),
            subject: subject.to_string(),
            token_id: claims.jti,
            entries,
        })
    }

    /// Processes a logout token and records its revocations.
    ///
    /// Returns once every write has completed; the entries written are
    /// returned.
    ///
    /// # Errors
    ///
    /// Everything [`parse`](Self::parse) reports, plus
    /// [`LogoutError::StoreUnavailable`] when a write fails or exceeds the
    /// write timeout.
    pub async fn ingest(&self, logout_token: &str) -> LogoutResult<Vec<RevocationEntry>> {
        let notification = self.parse(logout_token)?;

        for entry in &notification.entries {
            let write = self.store.revoke(&entry.token_key, entry.expires_at);
            match tokio::time::timeout(self.write_timeout, write).await {
                Ok(result) => result?,
                Err(_) => return Err(StoreError::Timeout(self.write_timeout).into()),
            }
        }

        tracing::info!(
            issuer = %notification.issuer,
            jti = notification.token_id.as_deref().unwrap_or("-"),
            revoked = notification.entries.len(),
            backend = %self.store.backend(),
            "back-channel logout accepted"
        );

        Ok(notification.entries)
    }
}

impl fmt::Debug for LogoutIngestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutIngestion")
            .field("backend", &self.store.backend())
            .field("revocation_ttl", &self.revocation_ttl)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

fn required<'a>(value: Option<&'a str>, claim: &str) -> LogoutResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LogoutError::Unsupported(format!("missing required claim '{claim}'")))
}
