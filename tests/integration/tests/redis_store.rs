//! Redis backend integration tests.
//!
//! Standalone tests start a Redis container and are ignored by default
//! (`cargo test -- --ignored` with docker available). The cluster test runs
//! against the nodes listed in `RG_TEST_REDIS_CLUSTER_URL` and is skipped
//! when it is unset.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use reqwest::StatusCode;
use rg_server::ServerConfig;
use rg_store::{RevocationStore, StoreBackend, StoreError};
use rg_store_redis::{RedisConfig, RedisRevocationStore};
use rg_token::testutil::{access_token, logout_token};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::redis::{REDIS_PORT, Redis};
use tokio::time::sleep;

use crate::common::TestEnv;

const ISSUER: &str = "https://idp.example.com/realms/main";

/// Starts a Redis container and returns it with its URL.
async fn start_redis() -> anyhow::Result<(ContainerAsync<Redis>, String)> {
    let container = Redis::default().start().await?;
    let port = container.get_host_port_ipv4(REDIS_PORT).await?;
    Ok((container, format!("redis://127.0.0.1:{port}")))
}

async fn connect(url: &str) -> anyhow::Result<RedisRevocationStore> {
    let config = RedisConfig::from_url_list(url)?
        .key_prefix(format!("it-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()));
    Ok(RedisRevocationStore::connect(config).await?)
}

/// Tests revoke and lookup against a standalone node.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_standalone_revoke_and_lookup() -> anyhow::Result<()> {
    let (_redis, url) = start_redis().await?;
    let store = connect(&url).await?;

    assert_eq!(store.backend(), StoreBackend::RedisStandalone);
    assert!(!store.is_revoked("sess-42").await?);

    store
        .revoke("sess-42", Utc::now() + TimeDelta::seconds(3600))
        .await?;
    assert!(store.is_revoked("sess-42").await?);
    assert!(!store.is_revoked("sess-43").await?);

    store.quit().await?;
    Ok(())
}

/// Tests that Redis expires revocations on its own.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_standalone_native_expiry() -> anyhow::Result<()> {
    let (_redis, url) = start_redis().await?;
    let store = connect(&url).await?;

    store
        .revoke("short", Utc::now() + TimeDelta::milliseconds(300))
        .await?;
    assert!(store.is_revoked("short").await?);

    sleep(Duration::from_millis(600)).await;
    assert!(!store.is_revoked("short").await?);
    Ok(())
}

/// Tests that the later of two expiries wins in either order.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_standalone_later_expiry_wins() -> anyhow::Result<()> {
    let (_redis, url) = start_redis().await?;
    let store = connect(&url).await?;
    let now = Utc::now();

    store.revoke("extend", now + TimeDelta::milliseconds(300)).await?;
    store.revoke("extend", now + TimeDelta::seconds(60)).await?;

    store.revoke("keep", now + TimeDelta::seconds(60)).await?;
    store.revoke("keep", now + TimeDelta::milliseconds(300)).await?;

    sleep(Duration::from_millis(600)).await;
    assert!(store.is_revoked("extend").await?);
    assert!(store.is_revoked("keep").await?);
    Ok(())
}

/// Tests that concurrent revocations of distinct keys are all recorded.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_standalone_concurrent_revocations() -> anyhow::Result<()> {
    let (_redis, url) = start_redis().await?;
    let store = connect(&url).await?;
    let expires_at = Utc::now() + TimeDelta::seconds(60);

    let keys: Vec<String> = (0..64).map(|i| format!("sess-{i}")).collect();
    let results =
        futures::future::join_all(keys.iter().map(|key| store.revoke(key, expires_at))).await;
    for result in results {
        result?;
    }

    for key in &keys {
        assert!(store.is_revoked(key).await?, "{key}");
    }
    Ok(())
}

/// Tests a master with one read replica.
///
/// The replica is read-only, so a successful revoke shows that writes go to
/// the master; lookups are served by the replica once it has caught up.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_master_replica_reads_from_replica() -> anyhow::Result<()> {
    let (master, master_url) = start_redis().await?;
    let master_ip = master.get_bridge_ip_address().await?;

    let replica = Redis::default()
        .with_cmd([
            "redis-server".to_string(),
            "--replicaof".to_string(),
            master_ip.to_string(),
            "6379".to_string(),
        ])
        .start()
        .await?;
    let replica_port = replica.get_host_port_ipv4(REDIS_PORT).await?;

    let store = connect(&format!("{master_url},redis://127.0.0.1:{replica_port}")).await?;
    assert_eq!(store.backend(), StoreBackend::RedisMasterReplica);

    store
        .revoke("sess-42", Utc::now() + TimeDelta::seconds(60))
        .await?;

    let mut visible = false;
    for _ in 0..50 {
        if store.is_revoked("sess-42").await? {
            visible = true;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(visible, "revocation not replicated to the read replica");
    assert!(!store.is_revoked("sess-43").await?);
    Ok(())
}

/// Tests logout and filtering through a server backed by Redis.
#[tokio::test]
#[ignore = "requires docker"]
async fn test_server_with_redis_backend() -> anyhow::Result<()> {
    let (_redis, url) = start_redis().await?;
    let mut config = ServerConfig::for_testing();
    config.store.redis_url = Some(url);

    let env = TestEnv::with_config(config).await?;
    let health: serde_json::Value = env.client.get(env.url("/health")).send().await?.json().await?;
    assert_eq!(health["backend"], "redis-standalone");

    let access = access_token("alice@example.com", Some("sess-42"));
    assert_eq!(env.verify(&access).await?.status(), StatusCode::NO_CONTENT);

    let response = env
        .logout(&logout_token(ISSUER, "alice@example.com", Some("sess-42")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(env.verify(&access).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

/// Tests that an unreachable Redis is reported as unavailable.
#[tokio::test]
async fn test_unreachable_redis_is_unavailable() -> anyhow::Result<()> {
    let config = RedisConfig::from_url_list("redis://127.0.0.1:1")?
        .connect_timeout(Duration::from_millis(500));

    let err = RedisRevocationStore::connect(config).await.err();

    assert!(
        matches!(err, Some(StoreError::Unavailable(_) | StoreError::Timeout(_))),
        "{err:?}"
    );
    Ok(())
}

/// Tests that a revocation written through one cluster node is visible
/// through another.
#[tokio::test]
async fn test_cluster_visibility_across_nodes() -> anyhow::Result<()> {
    let Ok(urls) = std::env::var("RG_TEST_REDIS_CLUSTER_URL") else {
        eprintln!("RG_TEST_REDIS_CLUSTER_URL not set, skipping");
        return Ok(());
    };
    let nodes: Vec<&str> = urls.split(',').map(str::trim).collect();
    anyhow::ensure!(nodes.len() >= 2, "need at least two cluster nodes");

    let prefix = format!("it-{}", Utc::now().timestamp_millis());
    let first = RedisRevocationStore::connect(
        RedisConfig::from_url_list(nodes[0])?
            .cluster(true)
            .key_prefix(prefix.clone()),
    )
    .await?;
    let second = RedisRevocationStore::connect(
        RedisConfig::from_url_list(nodes[1])?
            .cluster(true)
            .key_prefix(prefix),
    )
    .await?;
    assert_eq!(first.backend(), StoreBackend::RedisCluster);

    first
        .revoke("sess-42", Utc::now() + TimeDelta::seconds(60))
        .await?;

    let mut visible = false;
    for _ in 0..20 {
        if second.is_revoked("sess-42").await? {
            visible = true;
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(visible, "revocation not visible through the second node");
    Ok(())
}
