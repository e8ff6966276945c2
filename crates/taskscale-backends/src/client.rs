//! Minimal JSON-over-HTTP client shared by the backends.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{BackendError, BackendResult};

/// A buffered HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub uri: String,
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> BackendResult<T> {
        serde_json::from_slice(&self.body).map_err(|source| BackendError::Decode {
            uri: self.uri.clone(),
            source,
        })
    }

    /// Fail with `BackendError::Status` unless the status is 2xx.
    pub fn error_for_status(self) -> BackendResult<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(BackendError::Status {
                uri: self.uri,
                status: self.status,
                body: String::from_utf8_lossy(&self.body).trim().to_string(),
            })
        }
    }
}

/// HTTP/1 client with a per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    pub async fn get(&self, uri: &str) -> BackendResult<HttpResponse> {
        self.send(Method::GET, uri, Bytes::new()).await
    }

    pub async fn post_json<T: Serialize>(
        &self,
        uri: &str,
        body: &T,
    ) -> BackendResult<HttpResponse> {
        let payload = serde_json::to_vec(body).map_err(|source| BackendError::Decode {
            uri: uri.to_string(),
            source,
        })?;
        self.send(Method::POST, uri, Bytes::from(payload)).await
    }

    async fn send(&self, method: Method, uri: &str, body: Bytes) -> BackendResult<HttpResponse> {
        let parsed: Uri = uri.parse().map_err(|e: http::uri::InvalidUri| BackendError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(parsed)
            .header("user-agent", "taskscale/0.1");
        if !body.is_empty() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(body))
            .map_err(|e| BackendError::InvalidUri {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;

        let exchange = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| BackendError::Request {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                })?;
            let status = resp.status();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| BackendError::Request {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                })?
                .to_bytes();
            Ok::<_, BackendError>(HttpResponse {
                uri: uri.to_string(),
                status,
                body,
            })
        };

        let result = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| BackendError::Timeout {
                uri: uri.to_string(),
                after: self.timeout,
            })?;

        if let Ok(resp) = &result {
            debug!(%method, %uri, status = %resp.status, "backend request");
        }
        result
    }
}

/// Join a base URL and a path, tolerating a trailing slash on the base.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{base}/{}", path.trim_start_matches('/'))
}

/// Percent-encode a query-string component.
pub(crate) fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
