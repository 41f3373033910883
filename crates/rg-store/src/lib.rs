//! # rg-store
//!
//! Revocation store abstraction for revoke-gate.
//!
//! This crate defines the [`RevocationStore`] interface shared by logout
//! ingestion (writes) and the request pre-filter (reads), together with the
//! in-process backend. The Redis backend lives in `rg-store-redis`.
//!
//! ## Semantics
//!
//! - A key with an expiry in the future is revoked.
//! - Absence, or an expiry in the past, means "not known revoked".
//! - Writes are monotonic: the later expiry wins.
//!
//! ## Example
//!
//! ```ignore
//! use chrono::{Duration, Utc};
//! use rg_store::{MemoryRevocationStore, RevocationStore};
//!
//! let store = MemoryRevocationStore::new();
//! store.revoke("sess-42", Utc::now() + Duration::hours(1)).await?;
//! assert!(store.is_revoked("sess-42").await?);
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod clock;
pub mod error;
pub mod memory;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryRevocationStore;
pub use store::{RevocationEntry, RevocationStore, StoreBackend};
