use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::observability::metrics::MetricsConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub logging: LogConfig,
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Service identity, exporters and span batching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub service_name: String,
    pub service_version: String,
    pub service_namespace: String,
    pub environment: String,
    /// OTLP/HTTP traces endpoint (Jaeger accepts OTLP on 4318)
    pub otlp_endpoint: Option<String>,
    /// Also print finished spans to stdout
    pub console_exporter: bool,
    pub sample_rate: f64,
    /// Request paths served without a server span
    pub ignored_paths: Vec<String>,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub max_queue_size: usize,
    #[serde(with = "humantime_serde")]
    pub scheduled_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub export_timeout: Duration,
    pub max_export_batch_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "chiccloset-fashion-backend".to_string(),
            service_version: "1.0.0".to_string(),
            service_namespace: "fashion-ecommerce".to_string(),
            environment: "development".to_string(),
            otlp_endpoint: Some("http://localhost:4318/v1/traces".to_string()),
            console_exporter: false,
            sample_rate: 1.0,
            ignored_paths: vec!["/health".to_string()],
            batch: BatchSettings::default(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            scheduled_delay: Duration::from_secs(5),
            export_timeout: Duration::from_secs(30),
            max_export_batch_size: 512,
        }
    }
}

impl TracingConfig {
    /// Settings for the shopper-side process
    pub fn storefront() -> Self {
        Self {
            service_name: "chiccloset-storefront".to_string(),
            service_namespace: "ecommerce".to_string(),
            ignored_paths: Vec::new(),
            ..Self::default()
        }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths.iter().any(|ignored| ignored == path)
    }
}
