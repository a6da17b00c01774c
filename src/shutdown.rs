//! Graceful Shutdown Handling
//!
//! Turns SIGTERM/SIGINT/Ctrl+C into a broadcast that the HTTP server and any
//! other long-running task can wait on.

use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Shutdown coordinator that fans a single stop signal out to components
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            timeout,
        }
    }

    /// How long components get to drain after the signal
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Future that resolves once shutdown has been triggered
    pub fn signaled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown_tx.subscribe();
        async move {
            // Lagged or closed both mean the signal went out
            let _ = rx.recv().await;
        }
    }

    /// Trigger shutdown of every subscriber
    pub fn trigger(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Shutdown triggered with no active subscribers");
        }
    }

    /// Wait for SIGTERM, SIGINT or Ctrl+C, then trigger shutdown
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, initiating graceful shutdown");
        }

        self.trigger();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let first = tokio::spawn(coordinator.signaled());
        let second = tokio::spawn(coordinator.signaled());

        coordinator.trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .expect("subscribers should observe shutdown");
    }

    #[test]
    fn test_timeout_is_kept() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(7));
        assert_eq!(coordinator.timeout(), Duration::from_secs(7));
    }
}
