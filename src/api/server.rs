//! Configuration API Server

use super::{handlers::AppState, router::ConfigApi};
use crate::{metrics::Metrics, tree::ConfigTree, Result};
use anyhow::Context;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Configuration API server
pub struct ApiServer {
    bind_addr: SocketAddr,
    app_state: AppState,
    expose_metrics: bool,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(bind_addr: SocketAddr, tree: ConfigTree, metrics: Arc<Metrics>) -> Self {
        Self {
            bind_addr,
            app_state: AppState::new(tree, metrics),
            expose_metrics: true,
        }
    }

    /// Whether `/metrics` is routed
    pub fn expose_metrics(mut self, enabled: bool) -> Self {
        self.expose_metrics = enabled;
        self
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind configuration API to {}", self.bind_addr))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!("Configuration API listening on {}", local_addr);

        let app = ConfigApi::create_router(self.app_state, self.expose_metrics);
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("Configuration API server error: {}", e);
            return Err(e.into());
        }

        info!("Configuration API stopped accepting requests");
        Ok(())
    }

    /// Create a router for testing
    pub fn create_test_router(&self) -> Router {
        ConfigApi::create_router(self.app_state.clone(), self.expose_metrics)
    }
}
