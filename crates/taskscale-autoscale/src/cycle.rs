//! The scaling cycle — one fetch → decide → apply pass over every function.
//!
//! A cycle owns no locks of its own. The only state shared between
//! overlapping cycles is the `CooldownTracker`, which locks per key
//! operation. Per-function failures are collected into the report and
//! never stop the remaining functions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use taskscale_core::config::AutoscaleConfig;
use taskscale_core::{ConfigResult, RawSample};

use crate::calculator::{ScaleDecision, calculate_replicas};
use crate::control::{FunctionResolver, MetricSource, NamespaceResolver, ReplicaControl};
use crate::cooldown::{CooldownTracker, CooldownTransition};
use crate::error::ScaleError;
use crate::event::{EventSink, ScalingEvent, TracingEventSink};
use crate::report::{CycleReport, ReplicaChange};

/// Static settings for every cycle run by one `ScalingCycle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    /// Metric queried from the source.
    pub metric: String,
    pub default_namespace: String,
    /// Idle time a function must exceed before scaling down.
    pub cooldown: Duration,
    /// Stop processing further functions once this much time has passed.
    pub deadline: Option<Duration>,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            metric: taskscale_core::config::DEFAULT_METRIC.to_string(),
            default_namespace: taskscale_core::config::DEFAULT_NAMESPACE.to_string(),
            cooldown: taskscale_core::config::DEFAULT_COOLDOWN,
            deadline: None,
        }
    }
}

impl CycleSettings {
    pub fn from_config(config: &AutoscaleConfig) -> ConfigResult<Self> {
        Ok(Self {
            metric: config.metric.clone(),
            default_namespace: config.default_namespace.clone(),
            cooldown: config.cooldown()?,
            deadline: config.cycle_deadline()?,
        })
    }
}

/// Ties a metric source to a replica control plane.
pub struct ScalingCycle {
    settings: CycleSettings,
    cooldowns: Arc<CooldownTracker>,
    source: Arc<dyn MetricSource>,
    control: Arc<dyn ReplicaControl>,
    resolver: Arc<dyn FunctionResolver>,
    events: Arc<dyn EventSink>,
}

impl ScalingCycle {
    /// Create a cycle with a fresh cooldown table, the namespace resolver,
    /// and tracing events.
    pub fn new(
        settings: CycleSettings,
        source: Arc<dyn MetricSource>,
        control: Arc<dyn ReplicaControl>,
    ) -> Self {
        Self {
            settings,
            cooldowns: Arc::new(CooldownTracker::new()),
            source,
            control,
            resolver: Arc::new(NamespaceResolver),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Share an existing cooldown table.
    pub fn with_cooldowns(mut self, cooldowns: Arc<CooldownTracker>) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub fn cooldowns(&self) -> &Arc<CooldownTracker> {
        &self.cooldowns
    }

    /// Run one cycle at the current instant.
    pub async fn run(&self) -> CycleReport {
        self.run_at(Instant::now()).await
    }

    /// Run one cycle, treating `now` as the observation time for cooldown
    /// bookkeeping.
    pub async fn run_at(&self, now: Instant) -> CycleReport {
        let mut report = CycleReport::new();
        let deadline = self.settings.deadline.map(|d| Instant::now() + d);

        let samples = match self.source.fetch(&self.settings.metric).await {
            Ok(samples) => samples,
            Err(source) => {
                report.push_error(ScaleError::MetricFetch {
                    metric: self.settings.metric.clone(),
                    source,
                });
                self.finish(&report);
                return report;
            }
        };

        self.events.emit(ScalingEvent::CycleStarted {
            metric: self.settings.metric.clone(),
            samples: samples.len(),
        });

        let total = samples.len();
        for (processed, sample) in samples.iter().enumerate() {
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                report.push_error(ScaleError::DeadlineExceeded {
                    skipped: total - processed,
                });
                break;
            }

            match self.scale_function(sample, now).await {
                Ok(Some(change)) => report.push_change(change),
                Ok(None) => {}
                Err(e) => report.push_error(e),
            }
        }

        self.finish(&report);
        report
    }

    fn finish(&self, report: &CycleReport) {
        self.events.emit(ScalingEvent::CycleFinished {
            errors: report.errors().len(),
            changes: report.changes().len(),
        });
    }

    /// Process one sample. Returns the applied change, if any.
    async fn scale_function(
        &self,
        sample: &RawSample,
        now: Instant,
    ) -> Result<Option<ReplicaChange>, ScaleError> {
        let function = sample.function_name.as_str();

        let undone = match sample.parse() {
            Ok(signal) => signal.undone_task_count,
            Err(source) => {
                self.events.emit(ScalingEvent::SampleRejected {
                    function: function.to_string(),
                    raw: sample.value.clone(),
                });
                return Err(ScaleError::InvalidSample {
                    function: function.to_string(),
                    value: sample.value.clone(),
                    source,
                });
            }
        };

        self.events.emit(ScalingEvent::SignalObserved {
            function: function.to_string(),
            value: undone,
        });

        match self.cooldowns.observe(function, undone, now) {
            CooldownTransition::Started => self.events.emit(ScalingEvent::CooldownStarted {
                function: function.to_string(),
            }),
            CooldownTransition::Cleared => self.events.emit(ScalingEvent::CooldownCleared {
                function: function.to_string(),
            }),
            CooldownTransition::Unchanged => {}
        }

        let target = self
            .resolver
            .resolve(&self.settings.default_namespace, function);
        if !target.is_scalable() {
            self.events.emit(ScalingEvent::FunctionSkipped {
                function: function.to_string(),
            });
            return Ok(None);
        }

        let config = self
            .control
            .get_replicas(&target.service_name, &target.namespace)
            .await
            .map_err(|source| ScaleError::ReplicaQuery {
                function: function.to_string(),
                service: target.service_name.clone(),
                namespace: target.namespace.clone(),
                source,
            })?;

        let idle = self
            .cooldowns
            .is_idle_long_enough(function, now, self.settings.cooldown);
        let current = config.current_replicas;
        let desired = calculate_replicas(undone, &config, idle);

        self.events.emit(ScalingEvent::ReplicasDecided {
            function: function.to_string(),
            service: target.service_name.clone(),
            namespace: target.namespace.clone(),
            from: current,
            to: desired,
        });

        let ScaleDecision::ScaleTo(desired) = ScaleDecision::between(current, desired) else {
            return Ok(None);
        };

        self.control
            .set_replicas(&target.service_name, &target.namespace, desired)
            .await
            .map_err(|source| ScaleError::ReplicaUpdate {
                function: function.to_string(),
                service: target.service_name.clone(),
                namespace: target.namespace.clone(),
                replicas: desired,
                source,
            })?;

        self.events.emit(ScalingEvent::ReplicasApplied {
            function: function.to_string(),
            from: current,
            to: desired,
        });

        Ok(Some(ReplicaChange {
            function: function.to_string(),
            from: current,
            to: desired,
        }))
    }
}
