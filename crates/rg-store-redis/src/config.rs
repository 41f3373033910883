//! Redis connection configuration.

use std::time::Duration;

use rg_store::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// A Redis node address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisNode {
    /// Host name or IP address.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl RedisNode {
    /// Creates a node address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// How the configured nodes are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisTopology {
    /// One node for reads and writes.
    Standalone(RedisNode),
    /// A writable master and read replicas.
    MasterReplica {
        /// Node receiving writes.
        master: RedisNode,
        /// Nodes serving reads.
        replicas: Vec<RedisNode>,
    },
    /// Seed nodes of a sharded cluster.
    Cluster(Vec<RedisNode>),
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Configured nodes, in the order given.
    pub nodes: Vec<RedisNode>,
    /// Redis cluster mode.
    #[serde(default)]
    pub cluster: bool,
    /// ACL username (optional).
    pub username: Option<String>,
    /// Redis password (optional).
    pub password: Option<String>,
    /// Redis database number. Ignored in cluster mode.
    #[serde(default)]
    pub database: u8,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Command timeout in milliseconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    /// Key prefix for all revocation keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            nodes: vec![RedisNode::new(default_host(), DEFAULT_PORT)],
            cluster: false,
            username: None,
            password: None,
            database: 0,
            connect_timeout_ms: default_connect_timeout(),
            command_timeout_ms: default_command_timeout(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    /// Creates a new Redis configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list of node addresses.
    ///
    /// Each entry is `host`, `host:port` or a `redis://[user:password@]host[:port][/db]`
    /// URL. Credentials and database are taken from the first entry that
    /// carries them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the list is empty or an entry
    /// cannot be parsed.
    pub fn from_url_list(list: &str) -> StoreResult<Self> {
        let mut config = Self {
            nodes: Vec::new(),
            ..Self::default()
        };

        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let url = parse_entry(entry)?;
            let host = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| StoreError::Configuration(format!("missing host in '{entry}'")))?;
            config
                .nodes
                .push(RedisNode::new(host, url.port().unwrap_or(DEFAULT_PORT)));

            if config.password.is_none() {
                config.password = url.password().map(ToString::to_string);
                if !url.username().is_empty() {
                    config.username = Some(url.username().to_string());
                }
            }
            if config.database == 0 {
                config.database = parse_database(&url, entry)?;
            }
        }

        if config.nodes.is_empty() {
            return Err(StoreError::Configuration(
                "redis url lists no nodes".to_string(),
            ));
        }
        Ok(config)
    }

    /// Enables or disables cluster mode.
    #[must_use]
    pub const fn cluster(mut self, cluster: bool) -> Self {
        self.cluster = cluster;
        self
    }

    /// Sets the Redis password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Sets the per-command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub const fn command_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Resolves how the configured nodes are used.
    ///
    /// Without cluster mode a single node is standalone; with several nodes
    /// the first one is the master and the others are replicas.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if no node is configured.
    pub fn topology(&self) -> StoreResult<RedisTopology> {
        let Some((first, rest)) = self.nodes.split_first() else {
            return Err(StoreError::Configuration(
                "no redis node configured".to_string(),
            ));
        };

        if self.cluster {
            Ok(RedisTopology::Cluster(self.nodes.clone()))
        } else if rest.is_empty() {
            Ok(RedisTopology::Standalone(first.clone()))
        } else {
            Ok(RedisTopology::MasterReplica {
                master: first.clone(),
                replicas: rest.to_vec(),
            })
        }
    }

    /// Formats a key with the configured prefix.
    #[must_use]
    pub fn prefixed_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    /// Returns the Redis key holding the revocation of `token_key`.
    #[must_use]
    pub fn revocation_key(&self, token_key: &str) -> String {
        self.prefixed_key(&format!("revoked:{token_key}"))
    }
}

const DEFAULT_PORT: u16 = 6379;

fn parse_entry(entry: &str) -> StoreResult<Url> {
    let candidate = if entry.contains("://") {
        entry.to_string()
    } else {
        format!("redis://{entry}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| StoreError::Configuration(format!("invalid redis address '{entry}': {e}")))?;

    match url.scheme() {
        "redis" | "redis-cluster" => Ok(url),
        other => Err(StoreError::Configuration(format!(
            "unsupported redis scheme '{other}' in '{entry}'"
        ))),
    }
}

fn parse_database(url: &Url, entry: &str) -> StoreResult<u8> {
    let path = url.path().trim_matches('/');
    if path.is_empty() {
        return Ok(0);
    }
    path.parse()
        .map_err(|_| StoreError::Configuration(format!("invalid database '{path}' in '{entry}'")))
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_to_millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_connect_timeout() -> u64 {
    5000
}

const fn default_command_timeout() -> u64 {
    2000
}

fn default_key_prefix() -> String {
    "rg".to_string()
}
