//! taskscale.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::duration::{format_duration, parse_duration};
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_METRIC: &str = "undone_task_num";
pub const DEFAULT_NAMESPACE: &str = "openfaas-fn";
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_HTTP_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskscaleConfig {
    pub autoscale: AutoscaleConfig,
    pub prometheus: EndpointConfig,
    pub gateway: EndpointConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoscaleConfig {
    /// Name of the workload metric queried every cycle.
    pub metric: String,
    pub default_namespace: String,
    /// Continuous idle time required before scaling down to the minimum.
    pub cooldown: String,
    /// Optional per-cycle deadline.
    pub cycle_deadline: Option<String>,
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            metric: DEFAULT_METRIC.to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            cooldown: format_duration(DEFAULT_COOLDOWN),
            cycle_deadline: None,
        }
    }
}

impl AutoscaleConfig {
    pub fn cooldown(&self) -> ConfigResult<Duration> {
        parse_field("autoscale.cooldown", &self.cooldown)
    }

    pub fn cycle_deadline(&self) -> ConfigResult<Option<Duration>> {
        self.cycle_deadline
            .as_deref()
            .map(|s| parse_field("autoscale.cycle_deadline", s))
            .transpose()
    }
}

/// An HTTP collaborator: base URL plus per-request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: DEFAULT_HTTP_TIMEOUT.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> ConfigResult<Duration> {
        parse_field("timeout", &self.timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8081 }
    }
}

impl TaskscaleConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: TaskscaleConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every duration parses and the metric name is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.autoscale.metric.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "autoscale.metric",
                reason: "must not be empty".to_string(),
            });
        }
        self.autoscale.cooldown()?;
        self.autoscale.cycle_deadline()?;
        parse_field("prometheus.timeout", &self.prometheus.timeout)?;
        parse_field("gateway.timeout", &self.gateway.timeout)?;
        Ok(())
    }
}

fn parse_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::Duration {
        field,
        value: value.to_string(),
    })
}
