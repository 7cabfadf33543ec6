//! Application state and server wiring
//!
//! `AppState` owns the transport, the coordinator, and the metrics
//! collector; `serve` binds the listener and runs the axum server with
//! graceful shutdown.

use crate::config::AppConfig;
use crate::coordinator::MatchCoordinator;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::service::http::create_router;
use crate::transport::WsTransport;
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state for the running service
pub struct AppState {
    config: AppConfig,
    transport: Arc<WsTransport>,
    coordinator: Arc<MatchCoordinator>,
    metrics: Arc<MetricsCollector>,
    started_at: Instant,
}

impl AppState {
    /// Initialize all service components from a validated configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);
        let transport = Arc::new(WsTransport::new());
        let coordinator = Arc::new(MatchCoordinator::new(transport.clone(), metrics.clone()));

        Ok(Self {
            config,
            transport,
            coordinator,
            metrics,
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<WsTransport> {
        &self.transport
    }

    pub fn coordinator(&self) -> &Arc<MatchCoordinator> {
        &self.coordinator
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Seconds since the service started
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Bind the configured port and serve until the shutdown future resolves
pub async fn serve<F>(state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config().service.port));
    let router = create_router(state.clone())?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Relay listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
