//! taskscale-autoscale — backlog-driven replica decisions.
//!
//! Each triggered cycle reads one workload signal per function (the
//! undone task count), tracks how long each function has been idle, and
//! moves replica counts through a control-plane collaborator.
//!
//! # Scaling Algorithm
//!
//! ```text
//! backlog = undone task count for the function
//!
//! if backlog > current_replicas:
//!     ScaleTo(min(backlog, max_replicas))
//!
//! if backlog == 0 and idle for longer than cooldown:
//!     ScaleTo(min_replicas)
//!
//! otherwise:
//!     NoChange
//! ```
//!
//! Idle time is measured from the first cycle that observed a zero
//! backlog and resets as soon as a non-zero backlog is seen.
//!
//! # Architecture
//!
//! ```text
//! ScalingCycle::run()
//!   ├── MetricSource::fetch()          ← one call per cycle
//!   └── per function
//!       ├── CooldownTracker::observe()
//!       ├── FunctionResolver::resolve()
//!       ├── ReplicaControl::get_replicas()
//!       ├── calculate_replicas()
//!       └── ReplicaControl::set_replicas()   (only on change)
//! ```

pub mod calculator;
pub mod control;
pub mod cooldown;
pub mod cycle;
pub mod error;
pub mod event;
pub mod report;

pub use calculator::{ScaleDecision, calculate_replicas};
pub use control::{FunctionResolver, MetricSource, NamespaceResolver, ReplicaControl};
pub use cooldown::{CooldownEntry, CooldownTracker, CooldownTransition};
pub use cycle::{CycleSettings, ScalingCycle};
pub use error::ScaleError;
pub use event::{EventSink, ScalingEvent, TracingEventSink};
pub use report::{CycleError, CycleReport, ReplicaChange};
