//! Errors collected during a scaling cycle.

use thiserror::Error;

/// One failure encountered by a cycle.
///
/// `MetricFetch` and `DeadlineExceeded` are cycle-wide and carry no
/// function. The remaining variants concern a single function and are
/// collected without stopping the cycle.
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("failed to fetch metric {metric}: {source:#}")]
    MetricFetch {
        metric: String,
        source: anyhow::Error,
    },

    #[error("function {function}: invalid sample value {value:?}")]
    InvalidSample {
        function: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("function {function}: reading replicas for {service}.{namespace}: {source:#}")]
    ReplicaQuery {
        function: String,
        service: String,
        namespace: String,
        source: anyhow::Error,
    },

    #[error("function {function}: scaling {service}.{namespace} to {replicas}: {source:#}")]
    ReplicaUpdate {
        function: String,
        service: String,
        namespace: String,
        replicas: u64,
        source: anyhow::Error,
    },

    #[error("cycle deadline exceeded, {skipped} functions not processed")]
    DeadlineExceeded { skipped: usize },
}

impl ScaleError {
    /// The function this error concerns, if it is per-function.
    pub fn function(&self) -> Option<&str> {
        match self {
            ScaleError::InvalidSample { function, .. }
            | ScaleError::ReplicaQuery { function, .. }
            | ScaleError::ReplicaUpdate { function, .. } => Some(function),
            ScaleError::MetricFetch { .. } | ScaleError::DeadlineExceeded { .. } => None,
        }
    }
}
