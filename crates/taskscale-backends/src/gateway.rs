//! Gateway replica control.
//!
//! Reads a function's replica count and scaling labels from the gateway's
//! function status endpoint, and writes new counts through its scale
//! endpoint.

use std::collections::HashMap;

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use taskscale_autoscale::ReplicaControl;
use taskscale_core::ScalingConfig;

use crate::client::{HttpClient, encode_query, join_url};
use crate::error::{BackendError, BackendResult};

pub const MIN_SCALE_LABEL: &str = "com.openfaas.scale.min";
pub const MAX_SCALE_LABEL: &str = "com.openfaas.scale.max";
pub const SCALE_FACTOR_LABEL: &str = "com.openfaas.scale.factor";

pub const DEFAULT_MIN_REPLICAS: u64 = 1;
pub const DEFAULT_MAX_REPLICAS: u64 = 20;
pub const DEFAULT_SCALING_FACTOR: u64 = 20;

/// Function status as returned by the gateway.
#[derive(Debug, Deserialize)]
struct FunctionStatus {
    #[serde(default)]
    replicas: u64,
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScaleRequest<'a> {
    service_name: &'a str,
    namespace: &'a str,
    replicas: u64,
}

/// Replica control backed by the gateway's system API.
pub struct GatewayControl {
    base_url: String,
    http: HttpClient,
}

impl GatewayControl {
    pub fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn function_uri(&self, path: &str, service_name: &str, namespace: &str) -> String {
        format!(
            "{}/{}?namespace={}",
            join_url(&self.base_url, path),
            encode_query(service_name),
            encode_query(namespace)
        )
    }

    pub async fn function_config(
        &self,
        service_name: &str,
        namespace: &str,
    ) -> BackendResult<ScalingConfig> {
        let uri = self.function_uri("/system/function", service_name, namespace);
        let resp = self.http.get(&uri).await?;
        if resp.status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(format!("{service_name}.{namespace}")));
        }
        let status: FunctionStatus = resp.error_for_status()?.json()?;
        Ok(scaling_config(service_name, namespace, status))
    }

    pub async fn scale(
        &self,
        service_name: &str,
        namespace: &str,
        replicas: u64,
    ) -> BackendResult<()> {
        let uri = self.function_uri("/system/scale-function", service_name, namespace);
        let body = ScaleRequest {
            service_name,
            namespace,
            replicas,
        };
        let resp = self.http.post_json(&uri, &body).await?;
        if resp.status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(format!("{service_name}.{namespace}")));
        }
        resp.error_for_status()?;
        debug!(service = %service_name, %namespace, replicas, "scale request accepted");
        Ok(())
    }
}

fn scaling_config(service_name: &str, namespace: &str, status: FunctionStatus) -> ScalingConfig {
    let labels = status.labels.unwrap_or_default();
    let label = |key: &str, default: u64| {
        labels
            .get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default)
    };

    ScalingConfig {
        service_name: service_name.to_string(),
        namespace: namespace.to_string(),
        current_replicas: status.replicas,
        min_replicas: label(MIN_SCALE_LABEL, DEFAULT_MIN_REPLICAS),
        max_replicas: label(MAX_SCALE_LABEL, DEFAULT_MAX_REPLICAS),
        scaling_factor: label(SCALE_FACTOR_LABEL, DEFAULT_SCALING_FACTOR),
    }
}

#[async_trait]
impl ReplicaControl for GatewayControl {
    async fn get_replicas(
        &self,
        service_name: &str,
        namespace: &str,
    ) -> anyhow::Result<ScalingConfig> {
        Ok(self.function_config(service_name, namespace).await?)
    }

    async fn set_replicas(
        &self,
        service_name: &str,
        namespace: &str,
        replicas: u64,
    ) -> anyhow::Result<()> {
        Ok(self.scale(service_name, namespace, replicas).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Path, Query, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    fn status(replicas: u64, labels: &[(&str, &str)]) -> FunctionStatus {
        FunctionStatus {
            replicas,
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn labels_set_bounds() {
        let cfg = scaling_config(
            "resize",
            "fn",
            status(
                3,
                &[
                    (MIN_SCALE_LABEL, "2"),
                    (MAX_SCALE_LABEL, "8"),
                    (SCALE_FACTOR_LABEL, "50"),
                ],
            ),
        );
        assert_eq!(cfg.current_replicas, 3);
        assert_eq!(cfg.min_replicas, 2);
        assert_eq!(cfg.max_replicas, 8);
        assert_eq!(cfg.scaling_factor, 50);
    }

    #[test]
    fn missing_or_bad_labels_use_defaults() {
        let cfg = scaling_config("resize", "fn", status(1, &[(MAX_SCALE_LABEL, "lots")]));
        assert_eq!(cfg.min_replicas, DEFAULT_MIN_REPLICAS);
        assert_eq!(cfg.max_replicas, DEFAULT_MAX_REPLICAS);
        assert_eq!(cfg.scaling_factor, DEFAULT_SCALING_FACTOR);

        let cfg = scaling_config("resize", "fn", FunctionStatus { replicas: 0, labels: None });
        assert_eq!(cfg.max_replicas, DEFAULT_MAX_REPLICAS);
    }

    #[test]
    fn scale_request_uses_camel_case() {
        let body = serde_json::to_value(ScaleRequest {
            service_name: "resize",
            namespace: "fn",
            replicas: 4,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"serviceName": "resize", "namespace": "fn", "replicas": 4})
        );
    }

    #[derive(Clone, Default)]
    struct Recorded {
        scaled: Arc<Mutex<Vec<(String, String, u64)>>>,
    }

    #[derive(Deserialize)]
    struct ScaleBody {
        #[serde(rename = "serviceName")]
        service_name: String,
        namespace: String,
        replicas: u64,
    }

    async fn function_status(
        Path(name): Path<String>,
        Query(q): Query<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        if name != "resize" {
            return (StatusCode::NOT_FOUND, "not found".to_string());
        }
        let ns = q.get("namespace").cloned().unwrap_or_default();
        let body = serde_json::json!({
            "name": "resize",
            "namespace": ns,
            "replicas": 2,
            "labels": {"com.openfaas.scale.max": "6"},
        });
        (StatusCode::OK, body.to_string())
    }

    async fn fake_gateway(recorded: Recorded) -> String {
        let router = Router::new()
            .route("/system/function/{name}", get(function_status))
            .route(
                "/system/scale-function/{name}",
                post(
                    |State(rec): State<Recorded>, Json(body): Json<ScaleBody>| async move {
                        rec.scaled
                            .lock()
                            .unwrap()
                            .push((body.service_name, body.namespace, body.replicas));
                        StatusCode::ACCEPTED
                    },
                ),
            )
            .with_state(recorded);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn get_replicas_reads_status_and_labels() {
        let base = fake_gateway(Recorded::default()).await;
        let control = GatewayControl::new(base, HttpClient::new(Duration::from_secs(5)));

        let cfg = control.get_replicas("resize", "openfaas-fn").await.unwrap();
        assert_eq!(cfg.namespace, "openfaas-fn");
        assert_eq!(cfg.current_replicas, 2);
        assert_eq!(cfg.min_replicas, 1);
        assert_eq!(cfg.max_replicas, 6);
    }

    #[tokio::test]
    async fn get_replicas_for_unknown_function_is_not_found() {
        let base = fake_gateway(Recorded::default()).await;
        let control = GatewayControl::new(base, HttpClient::new(Duration::from_secs(5)));

        let err = control.function_config("ghost", "openfaas-fn").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(ref f) if f == "ghost.openfaas-fn"));
    }

    #[tokio::test]
    async fn set_replicas_posts_scale_request() {
        let recorded = Recorded::default();
        let base = fake_gateway(recorded.clone()).await;
        let control = GatewayControl::new(base, HttpClient::new(Duration::from_secs(5)));

        control.set_replicas("resize", "openfaas-fn", 5).await.unwrap();

        let scaled = recorded.scaled.lock().unwrap().clone();
        let want = ("resize".to_string(), "openfaas-fn".to_string(), 5);
        assert_eq!(scaled, vec![want]);
    }
}
