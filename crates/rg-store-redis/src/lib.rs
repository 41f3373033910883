//! # rg-store-redis
//!
//! Redis revocation store for revoke-gate.
//!
//! This crate implements [`rg_store::RevocationStore`] on top of the `fred`
//! client, shared by every gateway instance pointing at the same Redis
//! deployment.
//!
//! ## Topologies
//!
//! - **Standalone**: one node serves reads and writes.
//! - **Master/replica**: the first configured node is the writable master,
//!   the remaining nodes serve reads. Replica reads are eventually
//!   consistent: a revocation may be invisible on a replica for the length of
//!   the replication lag.
//! - **Cluster**: every configured node is a seed; keys are routed to the
//!   shard that owns them.
//!
//! ## Example
//!
//! ```ignore
//! use rg_store_redis::{RedisConfig, RedisRevocationStore};
//!
//! let config = RedisConfig::from_url_list("redis-1:6379,redis-2:6379")?.cluster(true);
//! let store = RedisRevocationStore::connect(config).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod store;

pub use config::{RedisConfig, RedisNode, RedisTopology};
pub use store::RedisRevocationStore;
