//! CCM Library
//!
//! Centralized configuration manager: a project → environment → key tree kept
//! in ZooKeeper and served over HTTP.

pub mod api;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod store;
pub mod tree;

pub use config::Config;
pub use error::{CcmError, CcmResult};
pub use shutdown::ShutdownCoordinator;
pub use store::StoreConnection;
pub use tree::{ConfigMap, ConfigTree};

/// Common error type for application plumbing
pub type Result<T> = anyhow::Result<T>;
