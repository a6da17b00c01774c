//! ZooKeeper Backend
//!
//! Capability interface over a `zookeeper-client` session. Nodes are created
//! persistent with an open ACL; writes carry no version check.

use super::backend::{ConfigStore, StoreError, StoreResult};
use super::connection::StoreConnector;
use super::path;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use zookeeper_client as zk;

/// Connects to a ZooKeeper ensemble (`host:port[,host:port][/chroot]`)
#[derive(Debug, Clone)]
pub struct ZkConnector {
    connect_timeout: Duration,
}

impl ZkConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl StoreConnector for ZkConnector {
    fn backend(&self) -> &'static str {
        "zookeeper"
    }

    async fn connect(&self, endpoint: &str) -> StoreResult<Arc<dyn ConfigStore>> {
        let client = timeout(self.connect_timeout, zk::Client::connect(endpoint))
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!(
                    "timed out after {:?} connecting to {}",
                    self.connect_timeout, endpoint
                ))
            })?
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", endpoint, e)))?;

        Ok(Arc::new(ZkStore::new(client)))
    }
}

/// Store backed by one ZooKeeper session
#[derive(Clone)]
pub struct ZkStore {
    client: zk::Client,
}

impl ZkStore {
    pub fn new(client: zk::Client) -> Self {
        Self { client }
    }

    fn create_options() -> zk::CreateOptions<'static> {
        zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all())
    }
}

/// Single-node primitives the write path is built from
#[async_trait]
trait NodeWriter: Send + Sync {
    async fn create(&self, path: &str, payload: &[u8]) -> Result<(), zk::Error>;
    async fn set(&self, path: &str, payload: &[u8]) -> Result<(), zk::Error>;
}

#[async_trait]
impl NodeWriter for ZkStore {
    async fn create(&self, path: &str, payload: &[u8]) -> Result<(), zk::Error> {
        self.client
            .create(path, payload, &Self::create_options())
            .await
            .map(|_| ())
    }

    async fn set(&self, path: &str, payload: &[u8]) -> Result<(), zk::Error> {
        self.client.set_data(path, payload, None).await.map(|_| ())
    }
}

/// Create the node, falling back to an unconditional set on a collision
async fn create_or_set<W: NodeWriter + ?Sized>(
    writer: &W,
    path: &str,
    payload: &[u8],
) -> Result<(), zk::Error> {
    match writer.create(path, payload).await {
        Err(zk::Error::NodeExists) => writer.set(path, payload).await,
        other => other,
    }
}

/// Create every missing ancestor with an empty payload; existing ones are left as is
async fn create_ancestors<W: NodeWriter + ?Sized>(writer: &W, path: &str) -> Result<(), zk::Error> {
    for ancestor in path::ancestors(path) {
        match writer.create(ancestor, &[]).await {
            Ok(()) => debug!(path = ancestor, "Created parent node"),
            Err(zk::Error::NodeExists) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn write_node<W: NodeWriter + ?Sized>(
    writer: &W,
    path: &str,
    payload: &[u8],
    create_parents: bool,
) -> Result<(), zk::Error> {
    match create_or_set(writer, path, payload).await {
        Err(zk::Error::NoNode) if create_parents => {
            debug!(path, "Parent missing, creating ancestors");
            create_ancestors(writer, path).await?;
            create_or_set(writer, path, payload).await
        }
        other => other,
    }
}

fn map_error(operation: &'static str, path: &str, err: zk::Error) -> StoreError {
    match err {
        zk::Error::NoNode => StoreError::NoNode(path.to_string()),
        zk::Error::NodeExists => StoreError::NodeExists(path.to_string()),
        other => StoreError::Operation {
            operation,
            path: path.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl ConfigStore for ZkStore {
    async fn exists(&self, path: &str) -> StoreResult<bool> {
        let stat = self
            .client
            .check_stat(path)
            .await
            .map_err(|e| map_error("exists", path, e))?;
        Ok(stat.is_some())
    }

    async fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        self.client
            .list_children(path)
            .await
            .map_err(|e| map_error("list_children", path, e))
    }

    async fn read(&self, path: &str) -> StoreResult<Bytes> {
        let (data, _stat) = self
            .client
            .get_data(path)
            .await
            .map_err(|e| map_error("read", path, e))?;
        Ok(Bytes::from(data))
    }

    async fn create_or_update(
        &self,
        path: &str,
        payload: Bytes,
        create_parents: bool,
    ) -> StoreResult<()> {
        write_node(self, path, &payload, create_parents)
            .await
            .map_err(|e| map_error("create_or_update", path, e))
    }
}
