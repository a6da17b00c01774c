//! Startup wiring: store connection and configuration tree

use crate::config::{StoreBackend, StoreConfig};
use crate::error::CcmResult;
use crate::store::{MemoryConnector, StoreConnection, StoreConnector, ZkConnector};
use crate::tree::ConfigTree;
use tracing::info;

/// Connect to the configured backend using its retry policy
pub async fn connect_store(config: &StoreConfig) -> CcmResult<StoreConnection> {
    let connector: Box<dyn StoreConnector> = match config.backend {
        StoreBackend::Zookeeper => Box::new(ZkConnector::new(config.connect_timeout)),
        StoreBackend::Memory => Box::new(MemoryConnector::new()),
    };

    info!(
        backend = connector.backend(),
        endpoint = %config.endpoint,
        max_retries = config.retry.max_retries,
        base_delay = ?config.retry.base_delay,
        "Connecting to coordination store"
    );

    StoreConnection::connect(connector.as_ref(), &config.endpoint, config.retry.policy()).await
}

/// Configuration tree over an established connection
pub fn build_tree(connection: &StoreConnection, config: &StoreConfig) -> CcmResult<ConfigTree> {
    ConfigTree::with_root(connection.handle(), &config.root)
}
