//! Collaborator seams: where signals come from, how names map to
//! services, and where replica changes go.

use async_trait::async_trait;
use taskscale_core::{FunctionRef, RawSample, ScalingConfig, split_function_name};

/// Supplies the per-function workload samples for a named metric.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch every (function, raw value) pair for `metric` at this instant.
    async fn fetch(&self, metric: &str) -> anyhow::Result<Vec<RawSample>>;
}

/// Reads and writes replica counts on the control plane.
#[async_trait]
pub trait ReplicaControl: Send + Sync {
    async fn get_replicas(
        &self,
        service_name: &str,
        namespace: &str,
    ) -> anyhow::Result<ScalingConfig>;

    async fn set_replicas(
        &self,
        service_name: &str,
        namespace: &str,
        replicas: u64,
    ) -> anyhow::Result<()>;
}

/// Maps a metric-level function name to a service identity.
///
/// An empty `service_name` in the result means "not scalable".
pub trait FunctionResolver: Send + Sync {
    fn resolve(&self, default_namespace: &str, function_name: &str) -> FunctionRef;
}

/// Resolves `name.namespace` style names, falling back to the default
/// namespace for bare names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceResolver;

impl FunctionResolver for NamespaceResolver {
    fn resolve(&self, default_namespace: &str, function_name: &str) -> FunctionRef {
        split_function_name(default_namespace, function_name)
    }
}
