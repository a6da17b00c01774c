//! Coordination Store Module
//!
//! Capability interface to the hierarchical store, the connection policy used
//! to reach it, and the available backends.

pub mod backend;
pub mod connection;
pub mod memory;
pub mod path;
pub mod zookeeper;

pub use backend::{ConfigStore, StoreError, StoreResult};
pub use connection::{RetryPolicy, StoreConnection, StoreConnector};
pub use memory::{MemoryConnector, MemoryStore};
pub use path::ConfigPath;
pub use zookeeper::{ZkConnector, ZkStore};
