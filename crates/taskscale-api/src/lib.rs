//! taskscale-api — HTTP entry point for the autoscaler.
//!
//! An alert webhook (or any other caller) triggers one scaling cycle per
//! request. Overlapping requests run overlapping cycles; they share only
//! the cooldown table.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/system/auto-scale` | Run one scaling cycle |
//! | GET | `/system/auto-scale/cooldowns` | List idle functions |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use taskscale_autoscale::ScalingCycle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub cycle: Arc<ScalingCycle>,
}

/// Build the complete API router.
pub fn build_router(cycle: Arc<ScalingCycle>) -> Router {
    let state = ApiState { cycle };

    Router::new()
        .route("/system/auto-scale", post(handlers::auto_scale))
        .route(
            "/system/auto-scale/cooldowns",
            get(handlers::list_cooldowns),
        )
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
