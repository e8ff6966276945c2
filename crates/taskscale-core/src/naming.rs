//! Function name resolution.
//!
//! Metric labels carry function names in `name` or `name.namespace` form.

use crate::types::FunctionRef;

/// Split a metric-level function name into service name and namespace.
///
/// The namespace follows the last `.`; a bare name falls back to
/// `default_namespace`. An empty input yields an empty (unscalable)
/// service name.
pub fn split_function_name(default_namespace: &str, function_name: &str) -> FunctionRef {
    match function_name.rsplit_once('.') {
        Some((name, namespace)) => FunctionRef {
            service_name: name.to_string(),
            namespace: namespace.to_string(),
        },
        None => FunctionRef {
            service_name: function_name.to_string(),
            namespace: default_namespace.to_string(),
        },
    }
}
