//! Error Types
//!
//! Outcomes of configuration tree operations. The HTTP layer matches on the
//! variant to pick a status code; nothing here is retried locally.

use crate::store::StoreError;
use thiserror::Error;

/// Result alias for configuration tree operations
pub type CcmResult<T> = std::result::Result<T, CcmError>;

/// Failure kinds surfaced by the configuration tree and store connection
#[derive(Debug, Error)]
pub enum CcmError {
    /// The store session could not be established within the retry budget
    #[error("failed to connect to coordination store at {endpoint} after {attempts} attempt(s): {source}")]
    Connection {
        endpoint: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// An explicitly addressed key does not exist
    #[error("Key not found")]
    NotFound { path: String },

    /// A path segment would escape or corrupt the configuration tree
    #[error("invalid path segment {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },

    /// A store call failed after the session was established
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl CcmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CcmError::NotFound { .. })
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CcmError::Connection { .. } => "unavailable",
            CcmError::NotFound { .. } => "not_found",
            CcmError::InvalidSegment { .. } => "invalid",
            CcmError::Store(_) => "store_error",
        }
    }
}
