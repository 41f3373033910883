//! Revocation store interface.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A revoked credential and the time its revocation may be forgotten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// Identifier derived from the token (session id, else subject).
    pub token_key: String,
    /// Instant after which the entry no longer denies anything.
    pub expires_at: DateTime<Utc>,
}

impl RevocationEntry {
    /// Creates a new entry.
    pub fn new(token_key: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_key: token_key.into(),
            expires_at,
        }
    }
}

/// The kind of backend behind a [`RevocationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// Process-local map; not shared between instances.
    InMemory,
    /// A single Redis node.
    RedisStandalone,
    /// Redis master with read replicas.
    RedisMasterReplica,
    /// Sharded Redis cluster.
    RedisCluster,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InMemory => "in-memory",
            Self::RedisStandalone => "redis-standalone",
            Self::RedisMasterReplica => "redis-master-replica",
            Self::RedisCluster => "redis-cluster",
        };
        f.write_str(name)
    }
}

/// Store of revoked token keys with per-entry expiry.
///
/// Implementations must be safe under unlimited concurrent callers. A backend
/// outage is reported as an error, never as "not revoked".
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks `token_key` as revoked until `expires_at`.
    ///
    /// Idempotent: revoking an already revoked key only ever extends its
    /// expiry to the later of the two values. An `expires_at` that is not in
    /// the future records nothing.
    async fn revoke(&self, token_key: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    /// Checks whether `token_key` is currently revoked.
    async fn is_revoked(&self, token_key: &str) -> StoreResult<bool>;

    /// Returns which backend serves this store.
    fn backend(&self) -> StoreBackend;
}
