//! Watch mode — triggers a scaling cycle on a fixed interval.
//!
//! Each tick runs one full cycle; a tick that arrives while a cycle is
//! still running is delayed, never overlapped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use taskscale_autoscale::ScalingCycle;

/// Run cycles every `interval` until `shutdown` flips.
pub async fn run_watch(
    cycle: Arc<ScalingCycle>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(interval_secs = interval.as_secs(), "autoscaler started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = cycle.run().await;
                if !report.is_success() {
                    for e in report.errors() {
                        warn!(index = e.index, error = %e.error, "autoscale error");
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("autoscaler shutting down");
                break;
            }
        }
    }
}
