//! In-process revocation store.
//!
//! Entries live in a sharded concurrent map owned by the serving process, so
//! lookups never contend on a global lock. Nothing is shared between
//! instances: this backend is only correct for single-instance deployments.
//!
//! Expiry is lazy (a lookup that finds an expired entry removes it) plus an
//! optional periodic sweep, which bounds memory by the number of currently
//! revoked keys even when most keys are never looked up again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreResult;
use crate::store::{RevocationStore, StoreBackend};

/// In-process revocation store backed by a [`DashMap`].
#[derive(Debug)]
pub struct MemoryRevocationStore {
    entries: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRevocationStore {
    /// Creates an empty store reading the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of entries held, including expired ones not yet reclaimed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, expires_at| {
            let keep = *expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Spawns a background task purging expired entries every `period`.
    ///
    /// The task holds only a weak reference and exits once the store is
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let removed = store.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "purged expired revocations");
                }
            }
        })
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token_key: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        if expires_at <= self.clock.now() {
            return Ok(());
        }

        // The entry guard locks one shard only, so the max-merge is atomic
        // per key without serializing unrelated keys.
        self.entries
            .entry(token_key.to_string())
            .and_modify(|current| {
                if expires_at > *current {
                    *current = expires_at;
                }
            })
            .or_insert(expires_at);

        Ok(())
    }

    async fn is_revoked(&self, token_key: &str) -> StoreResult<bool> {
        let now = self.clock.now();
        let Some(expires_at) = self.entries.get(token_key).map(|entry| *entry.value()) else {
            return Ok(false);
        };

        if expires_at > now {
            return Ok(true);
        }

        // Re-checked under the shard lock: a concurrent revoke may have
        // extended the entry since it was read.
        self.entries.remove_if(token_key, |_, expires_at| *expires_at <= now);
        Ok(false)
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::InMemory
    }
}
