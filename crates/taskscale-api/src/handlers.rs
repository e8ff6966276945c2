//! HTTP handlers.
//!
//! A cycle with no errors answers `200` with the applied changes. Any
//! error answers `500` with one `[AutoScale] [<index>] <message>` line per
//! error, so a caller sees every failure rather than just the first.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
        })
    }
}

/// POST /system/auto-scale
pub async fn auto_scale(State(state): State<ApiState>) -> impl IntoResponse {
    for entry in state.cycle.cooldowns().snapshot(Instant::now()) {
        info!(function = %entry.function, idle_secs = entry.idle_secs, "cooldown in progress");
    }

    let report = state.cycle.run().await;

    if report.is_success() {
        return ApiResponse::ok(report.changes()).into_response();
    }

    let body = report.render();
    warn!(
        errors = report.errors().len(),
        "autoscale cycle reported errors"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [("content-type", "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// GET /system/auto-scale/cooldowns
pub async fn list_cooldowns(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.cycle.cooldowns().snapshot(Instant::now()))
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
