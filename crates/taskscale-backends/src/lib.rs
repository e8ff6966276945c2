//! taskscale-backends — HTTP collaborators for the scaling cycle.
//!
//! # Architecture
//!
//! ```text
//! PrometheusSource  (MetricSource)
//!   └── GET {prometheus}/api/v1/query?query=<metric>
//!
//! GatewayControl    (ReplicaControl)
//!   ├── GET  {gateway}/system/function/{name}?namespace=<ns>
//!   └── POST {gateway}/system/scale-function/{name}?namespace=<ns>
//! ```
//!
//! Both share one `HttpClient`, which bounds every request with a
//! timeout. Retries are left to the next triggered cycle.

pub mod client;
pub mod error;
pub mod gateway;
pub mod prometheus;

pub use client::HttpClient;
pub use error::{BackendError, BackendResult};
pub use gateway::GatewayControl;
pub use prometheus::PrometheusSource;
