//! Backend error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors talking to Prometheus or the gateway.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("request to {uri} failed: {reason}")]
    Request { uri: String, reason: String },

    #[error("request to {uri} timed out after {after:?}")]
    Timeout { uri: String, after: Duration },

    #[error("{uri} returned {status}: {body}")]
    Status {
        uri: String,
        status: http::StatusCode,
        body: String,
    },

    #[error("function not found: {0}")]
    NotFound(String),

    #[error("malformed response from {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("prometheus query failed: {0}")]
    Query(String),
}
