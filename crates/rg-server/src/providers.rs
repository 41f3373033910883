//! Store selection.
//!
//! Exactly one [`RevocationStore`] is built at startup and shared by logout
//! ingestion and the request filter for the lifetime of the process.

use std::sync::Arc;

use rg_store::{Clock, MemoryRevocationStore, RevocationStore, StoreError, StoreResult};
use rg_store_redis::{RedisConfig, RedisRevocationStore};

use crate::config::StoreSettings;

/// Builds the revocation store described by `settings`.
///
/// - no Redis URL: in-process store, swept every `sweep_interval`
/// - URL with cluster mode: Redis cluster
/// - URL with one node: standalone Redis
/// - URL with several nodes: master (first node) and replicas
///
/// `clock` drives expiry of the in-process store; Redis expires keys itself.
///
/// # Errors
///
/// Returns [`StoreError::Configuration`] if cluster mode is enabled without
/// a URL or the URL cannot be parsed, and [`StoreError::Unavailable`] if
/// Redis cannot be reached.
pub async fn build_store(
    settings: &StoreSettings,
    clock: Arc<dyn Clock>,
) -> StoreResult<Arc<dyn RevocationStore>> {
    let Some(url) = settings.redis_url.as_deref() else {
        if settings.cluster_enabled {
            return Err(StoreError::Configuration(
                "redis cluster mode enabled but no redis url configured".to_string(),
            ));
        }

        let store = Arc::new(MemoryRevocationStore::with_clock(clock));
        // The sweeper holds a weak reference and ends with the store.
        let _sweeper = store.spawn_sweeper(settings.sweep_interval);
        tracing::info!(
            sweep_interval = ?settings.sweep_interval,
            "using in-process revocation store"
        );
        return Ok(store);
    };

    let config = RedisConfig::from_url_list(url)?
        .cluster(settings.cluster_enabled)
        .key_prefix(settings.key_prefix.clone())
        .command_timeout(settings.command_timeout)
        .connect_timeout(settings.connect_timeout);

    let store = RedisRevocationStore::connect(config).await?;
    Ok(Arc::new(store))
}
