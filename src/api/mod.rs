//! Configuration API Module
//!
//! HTTP surface over the configuration tree.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use router::ConfigApi;
pub use server::ApiServer;
pub use types::*;
