//! Replica calculation.
//!
//! Pure: no shared state, no side effects. The caller decides whether the
//! result warrants a control-plane call.

use taskscale_core::ScalingConfig;

/// A scaling decision for a single function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Scale to the specified replica count.
    ScaleTo(u64),
    /// No change needed.
    NoChange,
}

impl ScaleDecision {
    pub fn between(current: u64, desired: u64) -> Self {
        if desired == current {
            ScaleDecision::NoChange
        } else {
            ScaleDecision::ScaleTo(desired)
        }
    }
}

/// Compute the replica count for a function.
///
/// In priority order:
/// 1. backlog above current replicas scales up to the backlog, capped at
///    `max_replicas`;
/// 2. a zero backlog that has been idle past the cooldown scales down to
///    `min_replicas`;
/// 3. anything else keeps `current_replicas`.
///
/// `scaling_factor` is carried on the config but does not influence the
/// result.
pub fn calculate_replicas(
    undone_task_count: u64,
    config: &ScalingConfig,
    idle_long_enough: bool,
) -> u64 {
    let current = config.current_replicas;

    if undone_task_count > current {
        undone_task_count.min(config.max_replicas)
    } else if undone_task_count == 0 && idle_long_enough {
        config.min_replicas
    } else {
        current
    }
}
