//! Shared types used across taskscale crates.

use serde::{Deserialize, Serialize};

/// One workload sample for one function, as seen in a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignal {
    pub function_name: String,
    /// Outstanding units of work at sample time.
    pub undone_task_count: u64,
}

/// A raw sample as returned by a metric source, before parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    pub function_name: String,
    pub value: String,
}

impl RawSample {
    pub fn new(function_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            value: value.into(),
        }
    }

    /// Parse the raw value as an undone task count.
    pub fn parse(&self) -> Result<FunctionSignal, std::num::ParseIntError> {
        Ok(FunctionSignal {
            function_name: self.function_name.clone(),
            undone_task_count: self.value.trim().parse()?,
        })
    }
}

/// Replica state and bounds for a service, read fresh from the control
/// plane every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingConfig {
    pub service_name: String,
    pub namespace: String,
    pub current_replicas: u64,
    pub min_replicas: u64,
    pub max_replicas: u64,
    /// Reserved for weighted scaling; carried but not used by the
    /// replica calculation yet.
    pub scaling_factor: u64,
}

/// A function name resolved to its service identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRef {
    pub service_name: String,
    pub namespace: String,
}

impl FunctionRef {
    /// An empty service name marks a function that cannot be scaled.
    pub fn is_scalable(&self) -> bool {
        !self.service_name.is_empty()
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.service_name, self.namespace)
    }
}
