//! # rg-server
//!
//! HTTP server for the revocation gate.
//!
//! This crate wires a single revocation store into:
//! - the back-channel logout endpoint that writes revocations
//! - the forward-auth `/verify` endpoint that reads them
//! - health check endpoints
//!
//! ## Usage
//!
//! ```ignore
//! use rg_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod providers;
pub mod router;
pub mod state;

pub use config::{ConfigError, ServerConfig, StoreSettings};
pub use providers::build_store;
pub use router::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rg_store::{Clock, RevocationStore, SystemClock};
use tokio::net::TcpListener;

/// The revocation gate server.
pub struct Server {
    config: ServerConfig,
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// This builds the revocation store selected by the configuration and
    /// connects to Redis when one is configured.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Creates a server whose expiry decisions read `clock`.
    pub async fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = build_store(&config.store, clock.clone()).await?;

        tracing::info!(
            backend = %store.backend(),
            failure_policy = %config.failure_policy,
            revocation_ttl_seconds = config.revocation_ttl_seconds,
            "revocation store ready"
        );

        Ok(Self {
            config,
            store,
            clock,
        })
    }

    /// Runs the server.
    ///
    /// This binds the configured address and blocks until it receives a
    /// shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.config.bind_address().parse()?;
        let listener = TcpListener::bind(addr).await?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serves requests on `listener` until `shutdown` completes.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let app = self.router();

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the revocation store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn RevocationStore> {
        self.store.clone()
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates the application router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn router(&self) -> Router {
        let state = AppState::new(self.config.clone(), self.store.clone(), self.clock.clone());
        create_router(state)
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
