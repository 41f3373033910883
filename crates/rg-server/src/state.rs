//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use rg_filter::{FilterState, RevocationFilter};
use rg_logout::{LogoutIngestion, LogoutState};
use rg_store::{Clock, RevocationStore};

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// The process-wide revocation store.
    pub store: Arc<dyn RevocationStore>,

    logout: LogoutState,
    filter: FilterState,
}

impl AppState {
    /// Creates a new application state around `store`.
    ///
    /// Ingestion and filter share the store; store calls made on behalf of
    /// a request are bounded by the configured command timeout.
    pub fn new(config: ServerConfig, store: Arc<dyn RevocationStore>, clock: Arc<dyn Clock>) -> Self {
        let timeout = config.store.command_timeout;

        let ingestion = LogoutIngestion::new(store.clone(), config.revocation_ttl())
            .with_clock(clock)
            .with_write_timeout(timeout);
        let filter = RevocationFilter::new(store.clone(), config.failure_policy)
            .with_lookup_timeout(timeout);

        Self {
            config,
            store,
            logout: LogoutState::new(ingestion),
            filter: FilterState::new(filter),
        }
    }

    /// Gets the state for the logout endpoint.
    pub fn logout_state(&self) -> LogoutState {
        self.logout.clone()
    }

    /// Gets the state for the filter endpoints.
    pub fn filter_state(&self) -> FilterState {
        self.filter.clone()
    }

    /// Returns the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}
