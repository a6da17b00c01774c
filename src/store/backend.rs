//! Store Capability Interface

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by a store backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("node {0} does not exist")]
    NoNode(String),

    #[error("node {0} already exists")]
    NodeExists(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} on {path} failed: {message}")]
    Operation {
        operation: &'static str,
        path: String,
        message: String,
    },
}

/// Narrow view of a hierarchical store.
///
/// Paths are absolute and `/`-separated. Implementations must be safe to call
/// concurrently from many requests through one shared handle.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Whether a node exists at `path`
    async fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Names of the direct children of `path`; the node must exist
    async fn list_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Payload of the node at `path`; the node must exist
    async fn read(&self, path: &str) -> StoreResult<Bytes>;

    /// Create `path` with `payload`, or overwrite its payload if it exists.
    ///
    /// With `create_parents`, missing ancestors are created with an empty
    /// payload; ancestors that already exist are left untouched.
    async fn create_or_update(
        &self,
        path: &str,
        payload: Bytes,
        create_parents: bool,
    ) -> StoreResult<()>;
}
