//! Redis revocation store.
//!
//! A revocation is one key, `<prefix>:revoked:<token key>`, whose value and
//! absolute expiry are the revocation's `expires_at` in Unix milliseconds.
//! Redis reclaims the key itself once it expires.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fred::prelude::*;
use fred::types::ExpireOptions;
use rg_store::{RevocationStore, StoreBackend, StoreError, StoreResult};

use crate::config::{RedisConfig, RedisNode, RedisTopology};
use crate::error::from_redis_error;

/// Redis-based revocation store.
pub struct RedisRevocationStore {
    writer: Client,
    readers: Vec<Client>,
    next_reader: AtomicUsize,
    backend: StoreBackend,
    config: RedisConfig,
}

impl RedisRevocationStore {
    /// Connects to the topology described by `config`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the configuration is invalid or a node cannot be
    /// reached within the connection timeout.
    pub async fn connect(config: RedisConfig) -> StoreResult<Self> {
        let (writer, readers, backend) = match config.topology()? {
            RedisTopology::Standalone(node) => {
                let writer = connect_client(&config, centralized(&node)).await?;
                (writer, Vec::new(), StoreBackend::RedisStandalone)
            }
            RedisTopology::MasterReplica { master, replicas } => {
                let writer = connect_client(&config, centralized(&master)).await?;
                let mut readers = Vec::with_capacity(replicas.len());
                for replica in &replicas {
                    readers.push(connect_client(&config, centralized(replica)).await?);
                }
                (writer, readers, StoreBackend::RedisMasterReplica)
            }
            RedisTopology::Cluster(nodes) => {
                let hosts: Vec<(&str, u16)> = nodes
                    .iter()
                    .map(|node| (node.host.as_str(), node.port))
                    .collect();
                let writer = connect_client(&config, ServerConfig::new_clustered(hosts)).await?;
                (writer, Vec::new(), StoreBackend::RedisCluster)
            }
        };

        tracing::info!(
            backend = %backend,
            nodes = config.nodes.len(),
            readers = readers.len(),
            "connected to redis revocation store"
        );

        Ok(Self {
            writer,
            readers,
            next_reader: AtomicUsize::new(0),
            backend,
            config,
        })
    }

    /// Closes every connection.
    ///
    /// ## Errors
    ///
    /// Returns the first error reported while closing.
    pub async fn quit(&self) -> StoreResult<()> {
        for reader in &self.readers {
            self.bounded(reader.quit()).await?;
        }
        self.bounded(self.writer.quit()).await
    }

    /// Picks the client serving the next read.
    ///
    /// Replicas are used round-robin; without replicas reads go to the
    /// writer.
    fn reader(&self) -> &Client {
        if self.readers.is_empty() {
            return &self.writer;
        }
        let index = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        &self.readers[index]
    }

    /// Runs a Redis command under the configured command timeout.
    async fn bounded<T, F>(&self, command: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, fred::error::Error>> + Send,
        T: Send,
    {
        let limit = self.config.command_timeout_duration();
        match tokio::time::timeout(limit, command).await {
            Ok(result) => result.map_err(from_redis_error),
            Err(_) => Err(StoreError::Timeout(limit)),
        }
    }

    /// `SET key <ms> NX PXAT <ms>`; returns whether the key was created.
    async fn create_if_absent(&self, key: &str, expires_at_ms: i64) -> StoreResult<bool> {
        let created: Option<String> = self
            .bounded(self.writer.set::<Option<String>, _, _>(
                key,
                expires_at_ms,
                Some(Expiration::PXAT(expires_at_ms)),
                Some(SetOptions::NX),
                false,
            ))
            .await?;
        Ok(created.is_some())
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token_key: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        if expires_at <= Utc::now() {
            return Ok(());
        }
        let key = self.config.revocation_key(token_key);
        let expires_at_ms = expires_at.timestamp_millis();

        if self.create_if_absent(&key, expires_at_ms).await? {
            return Ok(());
        }

        // Only moves the expiry forward (Redis >= 7.0).
        let extended: bool = self
            .bounded(self.writer.pexpire_at::<bool, _>(
                &key,
                expires_at_ms,
                Some(ExpireOptions::GT),
            ))
            .await?;
        if extended {
            return Ok(());
        }

        // Either the stored expiry is already later, which the NX below
        // leaves alone, or the key expired between the two commands.
        self.create_if_absent(&key, expires_at_ms).await?;
        Ok(())
    }

    async fn is_revoked(&self, token_key: &str) -> StoreResult<bool> {
        let key = self.config.revocation_key(token_key);
        let count: i64 = self.bounded(self.reader().exists::<i64, _>(&key)).await?;
        Ok(count > 0)
    }

    fn backend(&self) -> StoreBackend {
        self.backend
    }
}

fn centralized(node: &RedisNode) -> ServerConfig {
    ServerConfig::new_centralized(node.host.as_str(), node.port)
}

/// Creates and initializes one client.
async fn connect_client(config: &RedisConfig, server: ServerConfig) -> StoreResult<Client> {
    let database = (!config.cluster && config.database != 0).then_some(config.database);
    let redis_config = Config {
        server,
        username: config.username.clone(),
        password: config.password.clone(),
        database,
        ..Config::default()
    };

    let client = Client::new(
        redis_config,
        None,
        None,
        Some(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2)),
    );

    let limit = config.connect_timeout_duration();
    match tokio::time::timeout(limit, client.init()).await {
        Ok(result) => {
            result.map_err(from_redis_error)?;
        }
        Err(_) => return Err(StoreError::Timeout(limit)),
    }

    Ok(client)
}
