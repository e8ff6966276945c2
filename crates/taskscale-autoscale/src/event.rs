//! Structured decision events.
//!
//! The cycle never logs directly. It emits `ScalingEvent`s to an
//! `EventSink`, and the surrounding component decides where they go.

use tracing::{debug, info, warn};

/// Something that happened during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalingEvent {
    CycleStarted { metric: String, samples: usize },
    SignalObserved { function: String, value: u64 },
    CooldownStarted { function: String },
    CooldownCleared { function: String },
    SampleRejected { function: String, raw: String },
    /// The function name did not resolve to a scalable service.
    FunctionSkipped { function: String },
    ReplicasDecided {
        function: String,
        service: String,
        namespace: String,
        from: u64,
        to: u64,
    },
    ReplicasApplied {
        function: String,
        from: u64,
        to: u64,
    },
    CycleFinished { errors: usize, changes: usize },
}

/// Receives decision events from a cycle.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ScalingEvent);
}

/// Routes events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ScalingEvent) {
        match event {
            ScalingEvent::CycleStarted { metric, samples } => {
                debug!(%metric, samples, "autoscale cycle started");
            }
            ScalingEvent::SignalObserved { function, value } => {
                debug!(%function, value, "undone tasks observed");
            }
            ScalingEvent::CooldownStarted { function } => {
                debug!(%function, "cooldown started");
            }
            ScalingEvent::CooldownCleared { function } => {
                debug!(%function, "cooldown cleared");
            }
            ScalingEvent::SampleRejected { function, raw } => {
                warn!(%function, %raw, "rejected malformed sample");
            }
            ScalingEvent::FunctionSkipped { function } => {
                debug!(%function, "not a scalable function, skipping");
            }
            ScalingEvent::ReplicasDecided {
                function,
                service,
                namespace,
                from,
                to,
            } => {
                debug!(%function, %service, %namespace, from, to, "replicas decided");
            }
            ScalingEvent::ReplicasApplied { function, from, to } => {
                info!(%function, from, to, "replicas scaled");
            }
            ScalingEvent::CycleFinished { errors, changes } => {
                if errors > 0 {
                    warn!(errors, changes, "autoscale cycle finished with errors");
                } else {
                    debug!(changes, "autoscale cycle finished");
                }
            }
        }
    }
}
