//! Store Connection
//!
//! Establishes the single long-lived store session with exponential backoff.
//! Reconnection after startup belongs to the backend client itself.

use super::backend::{ConfigStore, StoreError, StoreResult};
use crate::error::{CcmError, CcmResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Opens a session against a store endpoint
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Backend name used in logs
    fn backend(&self) -> &'static str;

    /// Make a single connection attempt
    async fn connect(&self, endpoint: &str) -> StoreResult<Arc<dyn ConfigStore>>;
}

/// Bounded exponential backoff for the initial connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    /// Total connection attempts; at least one is always made
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after failed attempt `attempt` (0-indexed): `base * 2^attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

/// Live, shared handle to the coordination store
#[derive(Clone)]
pub struct StoreConnection {
    endpoint: String,
    store: Arc<dyn ConfigStore>,
}

impl StoreConnection {
    /// Connect to `endpoint`, backing off between failed attempts.
    ///
    /// Fails with [`CcmError::Connection`] once every attempt is spent.
    pub async fn connect(
        connector: &dyn StoreConnector,
        endpoint: &str,
        policy: RetryPolicy,
    ) -> CcmResult<Self> {
        let attempts = policy.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            debug!(
                backend = connector.backend(),
                endpoint,
                attempt = attempt + 1,
                max_attempts = attempts,
                "Connecting to coordination store"
            );

            match connector.connect(endpoint).await {
                Ok(store) => {
                    info!(
                        backend = connector.backend(),
                        endpoint,
                        attempt = attempt + 1,
                        "Connected to coordination store"
                    );
                    return Ok(Self::from_store(endpoint, store));
                }
                Err(e) => {
                    warn!(
                        backend = connector.backend(),
                        endpoint,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "Coordination store connection attempt failed"
                    );
                    last_error = Some(e);

                    if attempt + 1 < attempts {
                        let delay = policy.delay(attempt);
                        debug!(?delay, "Backing off before next connection attempt");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(CcmError::Connection {
            endpoint: endpoint.to_string(),
            attempts,
            source: last_error
                .unwrap_or_else(|| StoreError::Unavailable("no connection attempt made".to_string())),
        })
    }

    /// Wrap an already established store
    pub fn from_store(endpoint: &str, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            store,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shared capability handle
    pub fn handle(&self) -> Arc<dyn ConfigStore> {
        Arc::clone(&self.store)
    }
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
