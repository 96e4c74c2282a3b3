use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use lifecycle::{Manager, Service};

use crate::config::ServerConfig;
use crate::web::{create_router, AppState};

struct RunningServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Brings the HTTP listener up and down and self-probes it for liveness.
pub struct HttpService {
    config: ServerConfig,
    manager: Manager,
    client: reqwest::Client,
    running: Mutex<Option<RunningServer>>,
}

impl HttpService {
    pub fn new(config: ServerConfig, manager: Manager) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            manager,
            client,
            running: Mutex::new(None),
        }
    }

    /// Address the listener is bound to; `None` before `start`.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|server| server.addr)
    }
}

#[async_trait]
impl Service for HttpService {
    fn name(&self) -> &str {
        "http-server"
    }

    async fn start(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", bind_addr, e))?;
        let addr = listener.local_addr()?;

        let app = create_router(AppState::new(self.manager.clone()), &self.config);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone().cancelled_owned();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
            {
                error!("HTTP server error: {}", err);
            }
        });

        info!("HTTP server listening on http://{}", addr);
        *self.running.lock().await = Some(RunningServer {
            addr,
            shutdown,
            handle,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(server) = self.running.lock().await.take() else {
            return Ok(());
        };

        server.shutdown.cancel();
        server
            .handle
            .await
            .map_err(|e| anyhow!("HTTP server task failed: {}", e))?;
        info!("HTTP server shut down");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let Some(addr) = self.local_addr().await else {
            return Err(anyhow!("HTTP server is not running"));
        };

        let url = format!("http://{}/health", addr);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Health probe to {} failed: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Health probe to {} returned {}",
                url,
                response.status()
            ));
        }
        Ok(())
    }
}
