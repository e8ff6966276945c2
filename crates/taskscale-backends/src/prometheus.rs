//! Prometheus instant-query metric source.
//!
//! Queries `/api/v1/query` and reads one sample per series, keyed by the
//! `function_name` label. Values are passed through as strings; parsing
//! them is the cycle's job so that one bad sample only affects its own
//! function.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use taskscale_autoscale::MetricSource;
use taskscale_core::RawSample;

use crate::client::{HttpClient, encode_query, join_url};
use crate::error::{BackendError, BackendResult};

/// Label carrying the function identity on each series.
pub const FUNCTION_LABEL: &str = "function_name";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: HashMap<String, String>,
    /// `[<unix timestamp>, "<value>"]`
    value: (f64, String),
}

/// Reads workload samples from a Prometheus server.
pub struct PrometheusSource {
    base_url: String,
    http: HttpClient,
}

impl PrometheusSource {
    pub fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Run an instant query and return one sample per labelled series.
    pub async fn query(&self, query: &str) -> BackendResult<Vec<RawSample>> {
        let uri = format!(
            "{}?query={}",
            join_url(&self.base_url, "/api/v1/query"),
            encode_query(query)
        );
        let resp = self.http.get(&uri).await?.error_for_status()?;
        let parsed: QueryResponse = resp.json()?;
        let samples = samples_from_response(parsed)?;
        debug!(%query, samples = samples.len(), "prometheus query");
        Ok(samples)
    }
}

fn samples_from_response(resp: QueryResponse) -> BackendResult<Vec<RawSample>> {
    if resp.status != "success" {
        return Err(BackendError::Query(
            resp.error.unwrap_or_else(|| format!("status {}", resp.status)),
        ));
    }

    let result = resp.data.map(|d| d.result).unwrap_or_default();
    Ok(result
        .into_iter()
        .filter_map(|mut s| {
            let function = s.metric.remove(FUNCTION_LABEL)?;
            Some(RawSample::new(function, s.value.1))
        })
        .collect())
}

#[async_trait]
impl MetricSource for PrometheusSource {
    async fn fetch(&self, metric: &str) -> anyhow::Result<Vec<RawSample>> {
        Ok(self.query(metric).await?)
    }
}
