//! End-to-end tests: webhook → cycle → Prometheus + gateway over HTTP.
//!
//! A single fake server plays both Prometheus and the gateway so the
//! real HTTP backends are exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use http_body_util::BodyExt;
use tower::ServiceExt;

use taskscale_api::build_router;
use taskscale_autoscale::{CycleSettings, ScalingCycle};
use taskscale_backends::{GatewayControl, HttpClient, PrometheusSource};

#[derive(Clone, Default)]
struct Fleet {
    /// function_name label → sample value reported by Prometheus.
    backlog: Arc<Mutex<Vec<(String, String)>>>,
    /// service → (replicas, max)
    services: Arc<Mutex<HashMap<String, (u64, u64)>>>,
    scale_calls: Arc<Mutex<Vec<(String, u64)>>>,
}

impl Fleet {
    fn with_backlog(self, function: &str, value: &str) -> Self {
        self.backlog
            .lock()
            .unwrap()
            .push((function.to_string(), value.to_string()));
        self
    }

    fn with_service(self, name: &str, replicas: u64, max: u64) -> Self {
        self.services
            .lock()
            .unwrap()
            .insert(name.to_string(), (replicas, max));
        self
    }

    fn set_backlog(&self, function: &str, value: &str) {
        let mut backlog = self.backlog.lock().unwrap();
        backlog.retain(|(f, _)| f != function);
        backlog.push((function.to_string(), value.to_string()));
    }

    fn replicas(&self, name: &str) -> u64 {
        self.services.lock().unwrap()[name].0
    }
}

async fn query(State(fleet): State<Fleet>) -> String {
    let result: Vec<serde_json::Value> = fleet
        .backlog
        .lock()
        .unwrap()
        .iter()
        .map(|(f, v)| serde_json::json!({"metric": {"function_name": f}, "value": [1.0, v]}))
        .collect();
    serde_json::json!({"status": "success", "data": {"resultType": "vector", "result": result}})
        .to_string()
}

async fn function_status(
    State(fleet): State<Fleet>,
    Path(name): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let services = fleet.services.lock().unwrap();
    match services.get(&name) {
        Some((replicas, max)) => (
            StatusCode::OK,
            serde_json::json!({
                "name": name,
                "namespace": q.get("namespace"),
                "replicas": replicas,
                "labels": {"com.openfaas.scale.min": "1", "com.openfaas.scale.max": max.to_string()}
            })
            .to_string(),
        ),
        None => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

async fn scale_function(
    State(fleet): State<Fleet>,
    Path(name): Path<String>,
    body: String,
) -> StatusCode {
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    let replicas = body["replicas"].as_u64().unwrap();
    fleet.scale_calls.lock().unwrap().push((name.clone(), replicas));
    if let Some(entry) = fleet.services.lock().unwrap().get_mut(&name) {
        entry.0 = replicas;
    }
    StatusCode::ACCEPTED
}

async fn start_fleet(fleet: Fleet) -> String {
    let router = Router::new()
        .route("/api/v1/query", get(query))
        .route("/system/function/{name}", get(function_status))
        .route("/system/scale-function/{name}", post(scale_function))
        .with_state(fleet);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn cycle_for(base: &str) -> Arc<ScalingCycle> {
    let http = HttpClient::new(Duration::from_secs(5));
    let source = PrometheusSource::new(base, http.clone());
    let control = GatewayControl::new(base, http);
    Arc::new(ScalingCycle::new(
        CycleSettings::default(),
        Arc::new(source),
        Arc::new(control),
    ))
}

fn trigger() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/system/auto-scale")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn webhook_scales_backlogged_function() {
    let fleet = Fleet::default()
        .with_backlog("resize", "4")
        .with_service("resize", 1, 10);
    let base = start_fleet(fleet.clone()).await;
    let router = build_router(cycle_for(&base));

    let resp = router.oneshot(trigger()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(fleet.replicas("resize"), 4);
}

#[tokio::test]
async fn webhook_reports_partial_failures() {
    let fleet = Fleet::default()
        .with_backlog("ghost", "2")
        .with_backlog("broken", "many")
        .with_backlog("resize.openfaas-fn", "30")
        .with_service("resize", 1, 10);
    let base = start_fleet(fleet.clone()).await;
    let router = build_router(cycle_for(&base));

    let resp = router.oneshot(trigger()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("[AutoScale] [0] function ghost"));
    assert!(text.contains("[AutoScale] [1] function broken"));

    // The healthy function is still scaled, clamped to its max.
    assert_eq!(fleet.replicas("resize"), 10);
}

#[tokio::test]
async fn unreachable_prometheus_fails_whole_cycle() {
    let cycle = cycle_for("http://127.0.0.1:9");
    let router = build_router(cycle.clone());

    let resp = router.oneshot(trigger()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("[AutoScale] [0] failed to fetch metric undone_task_num"));
    assert!(cycle.cooldowns().is_empty());
}

#[tokio::test]
async fn idle_function_scales_down_after_cooldown() {
    let fleet = Fleet::default()
        .with_backlog("resize", "6")
        .with_service("resize", 1, 10);
    let base = start_fleet(fleet.clone()).await;
    let cycle = cycle_for(&base);

    let t0 = Instant::now();
    assert!(cycle.run_at(t0).await.is_success());
    assert_eq!(fleet.replicas("resize"), 6);

    fleet.set_backlog("resize", "0");
    cycle.run_at(t0 + Duration::from_secs(60)).await;
    cycle.run_at(t0 + Duration::from_secs(60 + 240)).await;
    assert_eq!(fleet.replicas("resize"), 6);

    cycle.run_at(t0 + Duration::from_secs(60 + 301)).await;
    assert_eq!(fleet.replicas("resize"), 1);

    // Already at min: no further scale calls.
    cycle.run_at(t0 + Duration::from_secs(60 + 600)).await;
    let calls = fleet.scale_calls.lock().unwrap().clone();
    let want = vec![("resize".to_string(), 6), ("resize".to_string(), 1)];
    assert_eq!(calls, want);
}

#[tokio::test]
async fn cooldowns_endpoint_lists_idle_functions() {
    let fleet = Fleet::default()
        .with_backlog("resize", "0")
        .with_service("resize", 2, 10);
    let base = start_fleet(fleet).await;
    let router = build_router(cycle_for(&base));

    let resp = router.clone().oneshot(trigger()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/system/auto-scale/cooldowns")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"][0]["function"], "resize");
}
