//! HTTP mapping of configuration errors

use crate::error::CcmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

impl CcmError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CcmError::NotFound { .. } => StatusCode::NOT_FOUND,
            CcmError::InvalidSegment { .. } => StatusCode::BAD_REQUEST,
            CcmError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CcmError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for CcmError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Configuration request failed");
        } else {
            debug!(error = %self, "Configuration request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_status_codes() {
        let not_found = CcmError::NotFound {
            path: "/configs/a/b/c".to_string(),
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Key not found");

        let store = CcmError::Store(StoreError::Unavailable("partition".to_string()));
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = CcmError::InvalidSegment {
            segment: "a/b".to_string(),
            reason: "segment must not contain '/'",
        };
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }
}
