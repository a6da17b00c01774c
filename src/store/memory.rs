//! In-Memory Store
//!
//! Process-local tree with the same node semantics as the coordination
//! store. Backs `--in-memory` development mode and the test suite.

use super::backend::{ConfigStore, StoreError, StoreResult};
use super::connection::StoreConnector;
use super::path;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Tree of nodes keyed by absolute path; `/` always exists
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, excluding the implicit root
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

fn check_absolute(operation: &'static str, path: &str) -> StoreResult<()> {
    if path.starts_with('/') && (path == "/" || !path.ends_with('/')) {
        Ok(())
    } else {
        Err(StoreError::Operation {
            operation,
            path: path.to_string(),
            message: "path must be absolute without a trailing '/'".to_string(),
        })
    }
}

fn node_exists(nodes: &BTreeMap<String, Bytes>, path: &str) -> bool {
    path == "/" || nodes.contains_key(path)
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn exists(&self, path: &str) -> StoreResult<bool> {
        check_absolute("exists", path)?;
        Ok(node_exists(&*self.nodes.read().await, path))
    }

    async fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        check_absolute("list_children", path)?;
        let nodes = self.nodes.read().await;
        if !node_exists(&nodes, path) {
            return Err(StoreError::NoNode(path.to_string()));
        }

        let prefix = path::join(path, "");
        let children = nodes
            .range(prefix.clone()..)
            .map(|(candidate, _)| candidate)
            .take_while(|candidate| candidate.starts_with(&prefix))
            .map(|candidate| &candidate[prefix.len()..])
            .filter(|rest| !rest.contains(path::SEPARATOR))
            .map(str::to_string)
            .collect();
        Ok(children)
    }

    async fn read(&self, path: &str) -> StoreResult<Bytes> {
        check_absolute("read", path)?;
        let nodes = self.nodes.read().await;
        match nodes.get(path) {
            Some(payload) => Ok(payload.clone()),
            None if path == "/" => Ok(Bytes::new()),
            None => Err(StoreError::NoNode(path.to_string())),
        }
    }

    async fn create_or_update(
        &self,
        path: &str,
        payload: Bytes,
        create_parents: bool,
    ) -> StoreResult<()> {
        check_absolute("create_or_update", path)?;
        if path == "/" {
            return Err(StoreError::Operation {
                operation: "create_or_update",
                path: path.to_string(),
                message: "the root node cannot be written".to_string(),
            });
        }

        let mut nodes = self.nodes.write().await;
        if let Some(existing) = nodes.get_mut(path) {
            *existing = payload;
            debug!(path, "Updated node");
            return Ok(());
        }

        let parent = path::parent(path);
        if !node_exists(&nodes, parent) {
            if !create_parents {
                return Err(StoreError::NoNode(parent.to_string()));
            }
            for ancestor in path::ancestors(path) {
                nodes.entry(ancestor.to_string()).or_insert_with(Bytes::new);
            }
        }

        nodes.insert(path.to_string(), payload);
        debug!(path, "Created node");
        Ok(())
    }
}

/// Hands out one shared [`MemoryStore`] regardless of endpoint
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self, _endpoint: &str) -> StoreResult<Arc<dyn ConfigStore>> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_requires_parent_without_create_parents() {
        let store = MemoryStore::new();
        let err = store
            .create_or_update("/configs/billing", Bytes::from_static(b"x"), false)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NoNode("/configs".to_string()));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_parents_builds_empty_ancestors() {
        let store = MemoryStore::new();
        store
            .create_or_update("/configs/billing/prod/timeout", Bytes::from_static(b"30s"), true)
            .await
            .unwrap();

        assert_eq!(store.len().await, 4);
        assert!(store.read("/configs/billing").await.unwrap().is_empty());
        assert_eq!(store.list_children("/configs").await.unwrap(), vec!["billing"]);
    }

    #[tokio::test]
    async fn test_existing_parent_payload_is_preserved() {
        let store = MemoryStore::new();
        store
            .create_or_update("/configs", Bytes::from_static(b"root"), true)
            .await
            .unwrap();
        store
            .create_or_update("/configs/billing", Bytes::from_static(b"x"), true)
            .await
            .unwrap();
        assert_eq!(store.read("/configs").await.unwrap(), Bytes::from_static(b"root"));
    }

    #[tokio::test]
    async fn test_list_children_only_direct_descendants() {
        let store = MemoryStore::new();
        for path in ["/a/b/c", "/a/b/d", "/a/bb", "/ab"] {
            store.create_or_update(path, Bytes::new(), true).await.unwrap();
        }

        assert_eq!(store.list_children("/a").await.unwrap(), vec!["b", "bb"]);
        assert_eq!(store.list_children("/a/b").await.unwrap(), vec!["c", "d"]);
        assert_eq!(store.list_children("/").await.unwrap(), vec!["a", "ab"]);
        assert!(matches!(
            store.list_children("/missing").await,
            Err(StoreError::NoNode(_))
        ));
    }

    #[tokio::test]
    async fn test_connector_shares_one_store() {
        let connector = MemoryConnector::new();
        let first = connector.connect("ignored:2181").await.unwrap();
        let second = connector.connect("other:2181").await.unwrap();

        first
            .create_or_update("/configs/billing", Bytes::from_static(b"x"), true)
            .await
            .unwrap();

        assert_eq!(second.read("/configs/billing").await.unwrap(), Bytes::from_static(b"x"));
        assert_eq!(connector.store().len().await, 2);
    }

    #[tokio::test]
    async fn test_relative_paths_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.exists("configs").await,
            Err(StoreError::Operation { .. })
        ));
    }
}
