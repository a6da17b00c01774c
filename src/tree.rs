//! Configuration Tree Access
//!
//! Reads and writes the project/environment/key tree through the store
//! capability interface. Nothing is cached; every call goes to the store.

use crate::error::{CcmError, CcmResult};
use crate::store::path::{self, DEFAULT_ROOT};
use crate::store::{ConfigPath, ConfigStore};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Key → value mapping of one environment
pub type ConfigMap = BTreeMap<String, String>;

/// Configuration operations over a shared store handle
#[derive(Clone)]
pub struct ConfigTree {
    store: Arc<dyn ConfigStore>,
    root: String,
}

impl ConfigTree {
    /// Tree rooted at `/configs`
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            root: DEFAULT_ROOT.to_string(),
        }
    }

    /// Tree rooted at `/<root>`; `root` follows the segment rules
    pub fn with_root(store: Arc<dyn ConfigStore>, root: &str) -> CcmResult<Self> {
        path::validate_segment(root)?;
        Ok(Self {
            store,
            root: root.to_string(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// All keys of an environment.
    ///
    /// A missing environment is an empty map. Children are read one by one,
    /// so the result is not an atomic snapshot; any failing read fails the
    /// whole call.
    pub async fn read_environment(&self, project: &str, environment: &str) -> CcmResult<ConfigMap> {
        let env_path = ConfigPath::environment(project, environment)?.store_path(&self.root);
        let mut config = ConfigMap::new();

        if !self.store.exists(&env_path).await? {
            debug!(path = %env_path, "Environment not found, returning empty configuration");
            return Ok(config);
        }

        for key in self.store.list_children(&env_path).await? {
            let payload = self.store.read(&path::join(&env_path, &key)).await?;
            config.insert(key, decode(&payload));
        }

        debug!(path = %env_path, keys = config.len(), "Read environment");
        Ok(config)
    }

    /// Value of a single key; a missing key is [`CcmError::NotFound`]
    pub async fn read_key(&self, project: &str, environment: &str, key: &str) -> CcmResult<String> {
        let key_path = ConfigPath::key(project, environment, key)?.store_path(&self.root);

        if !self.store.exists(&key_path).await? {
            debug!(path = %key_path, "Key not found");
            return Err(CcmError::NotFound { path: key_path });
        }

        let payload = self.store.read(&key_path).await?;
        Ok(decode(&payload))
    }

    /// Create or overwrite a key, creating project and environment nodes as
    /// needed. Last writer wins.
    pub async fn upsert_key(
        &self,
        project: &str,
        environment: &str,
        key: &str,
        value: impl Into<Bytes>,
    ) -> CcmResult<()> {
        let key_path = ConfigPath::key(project, environment, key)?.store_path(&self.root);
        let value = value.into();
        let size = value.len();

        self.store.create_or_update(&key_path, value, true).await?;

        debug!(path = %key_path, bytes = size, "Upserted key");
        Ok(())
    }

    /// Round trip to the store root; a missing root still counts as reachable
    pub async fn ping(&self) -> CcmResult<bool> {
        Ok(self.store.exists(&path::join("/", &self.root)).await?)
    }
}

/// Invalid UTF-8 is replaced rather than rejected
fn decode(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}

impl std::fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tree() -> (Arc<MemoryStore>, ConfigTree) {
        let store = Arc::new(MemoryStore::new());
        let tree = ConfigTree::new(store.clone());
        (store, tree)
    }

    #[tokio::test]
    async fn test_upsert_writes_under_configs_root() {
        let (store, tree) = tree();
        tree.upsert_key("billing", "prod", "timeout", "30s").await.unwrap();

        assert_eq!(
            store.read("/configs/billing/prod/timeout").await.unwrap(),
            Bytes::from_static(b"30s")
        );
        assert!(store.exists("/configs/billing").await.unwrap());
    }

    #[tokio::test]
    async fn test_custom_root() {
        let store = Arc::new(MemoryStore::new());
        let tree = ConfigTree::with_root(store.clone(), "ccm").unwrap();
        tree.upsert_key("a", "b", "c", "d").await.unwrap();

        assert!(store.exists("/ccm/a/b/c").await.unwrap());
        assert!(!store.exists("/configs").await.unwrap());
        assert!(ConfigTree::with_root(store, "a/b").is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let (store, tree) = tree();
        store
            .create_or_update("/configs/p/e/k", Bytes::from_static(&[0x66, 0xff, 0x6f]), true)
            .await
            .unwrap();

        assert_eq!(tree.read_key("p", "e", "k").await.unwrap(), "f\u{fffd}o");
    }

    #[tokio::test]
    async fn test_invalid_segment_never_reaches_store() {
        let (store, tree) = tree();
        let err = tree.upsert_key("billing", "prod", "a/b", "x").await.unwrap_err();

        assert!(matches!(err, CcmError::InvalidSegment { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ping_without_root_node() {
        let (_store, tree) = tree();
        assert!(!tree.ping().await.unwrap());
        tree.upsert_key("p", "e", "k", "v").await.unwrap();
        assert!(tree.ping().await.unwrap());
    }
}
