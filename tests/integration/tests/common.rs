//! Common test utilities and fixtures.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use rg_server::{Server, ServerConfig};
use rg_store::{ManualClock, RevocationStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Test environment running a server with the in-process store.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client for testing.
    pub client: Client,
    /// Clock the server reads; advance it to expire revocations.
    pub clock: Arc<ManualClock>,
    /// The server's revocation store.
    pub store: Arc<dyn RevocationStore>,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestEnv {
    /// Starts a server with the testing configuration.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(ServerConfig::for_testing()).await
    }

    /// Starts a server with `config`, bound to an ephemeral loopback port.
    pub async fn with_config(config: ServerConfig) -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rg_server=debug,rg_logout=debug,rg_filter=debug")
            .with_test_writer()
            .try_init();

        let clock = Arc::new(ManualClock::starting_now());
        let server = Server::with_clock(config, clock.clone()).await?;
        let store = server.store();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let (_shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve(listener, shutdown).await {
                tracing::error!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            clock,
            store,
            _shutdown_tx,
        })
    }

    /// Returns the URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts a back-channel logout notification.
    pub async fn logout(&self, logout_token: &str) -> anyhow::Result<Response> {
        Ok(self
            .client
            .post(self.url("/backchannel-logout"))
            .form(&[("logout_token", logout_token)])
            .send()
            .await?)
    }

    /// Asks the forward-auth endpoint about `access_token`.
    pub async fn verify(&self, access_token: &str) -> anyhow::Result<Response> {
        Ok(self
            .client
            .get(self.url("/verify"))
            .bearer_auth(access_token)
            .send()
            .await?)
    }
}

/// Waits for the server to answer its liveness check.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let url = format!("{base_url}/health/live");
    for _ in 0..50 {
        if let Ok(response) = client.get(&url).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("server did not become ready at {base_url}")
}
