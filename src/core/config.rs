//! # Configuration Module
//!
//! This module handles configuration for the storefront API server.
//! It provides the configuration structures and the loading pipeline:
//!
//! 1. parse `config/chiccloset.yaml` (or the file named by `CHICCLOSET_CONFIG_PATH`);
//!    every section has defaults, so a partial file or no file at all is fine
//! 2. apply environment variable overrides
//! 3. validate the result, collecting every problem into one error message

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::error::{StoreError, StoreResult};
use crate::observability::config::{LogFormat, ObservabilityConfig};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CHICCLOSET_CONFIG_PATH";

/// Configuration file used when `CHICCLOSET_CONFIG_PATH` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/chiccloset.yaml";

/// Largest accepted `simulation.latency_scale`
pub const MAX_LATENCY_SCALE: f64 = 1000.0;

/// Main storefront configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Listener settings
    pub server: ServerSettings,

    /// Cross-origin policy for the browser storefront
    pub cors: CorsSettings,

    /// Simulated database and payment latency
    pub simulation: SimulationConfig,

    /// Observability settings (logging, tracing, metrics)
    pub observability: ObservabilityConfig,
}

impl StoreConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await.map_err(|e| {
            StoreError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `CHICCLOSET_CONFIG_PATH`, falling back to defaults when the file is absent
    pub async fn load() -> StoreResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path, "Loading configuration file");
            return Self::load_from_file(&path).await;
        }

        warn!(path = %path, "Configuration file not found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document without env overrides or validation
    pub fn from_yaml(content: &str) -> StoreResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| StoreError::config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) -> StoreResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source.
    ///
    /// `apply_env_overrides` feeds this from the process environment; tests feed it
    /// from a map so they never touch global state.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> StoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| StoreError::config(format!("Invalid PORT: {}", e)))?;
        }

        if let Some(addr) = lookup("CHICCLOSET_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Some(timeout) = lookup("CHICCLOSET_REQUEST_TIMEOUT") {
            self.server.request_timeout = humantime::parse_duration(&timeout).map_err(|e| {
                StoreError::config(format!("Invalid CHICCLOSET_REQUEST_TIMEOUT: {}", e))
            })?;
        }

        if let Some(level) = lookup("CHICCLOSET_LOG_LEVEL") {
            self.observability.logging.level = level;
        }

        if let Some(format) = lookup("CHICCLOSET_LOG_FORMAT") {
            self.observability.logging.format = format
                .parse::<LogFormat>()
                .map_err(|e| StoreError::config(format!("Invalid CHICCLOSET_LOG_FORMAT: {}", e)))?;
        }

        if let Some(enabled) = lookup("CHICCLOSET_TRACING_ENABLED") {
            self.observability.tracing.enabled = enabled.parse().map_err(|e| {
                StoreError::config(format!("Invalid CHICCLOSET_TRACING_ENABLED: {}", e))
            })?;
        }

        if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT") {
            self.observability.tracing.otlp_endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }

        if let Some(rate) = lookup("CHICCLOSET_PAYMENT_FAILURE_RATE") {
            self.simulation.payment_failure_rate = rate.parse().map_err(|e| {
                StoreError::config(format!("Invalid CHICCLOSET_PAYMENT_FAILURE_RATE: {}", e))
            })?;
        }

        if let Some(scale) = lookup("CHICCLOSET_LATENCY_SCALE") {
            self.simulation.latency_scale = scale.parse().map_err(|e| {
                StoreError::config(format!("Invalid CHICCLOSET_LATENCY_SCALE: {}", e))
            })?;
        }

        Ok(())
    }

    /// Configuration validation with detailed error messages
    pub fn validate(&self) -> StoreResult<()> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be greater than 0".to_string());
        }

        if self.server.bind_address.is_empty() {
            errors.push("server.bind_address cannot be empty".to_string());
        }

        if self.server.request_timeout.is_zero() {
            errors.push("server.request_timeout must be greater than 0".to_string());
        }

        if self.server.max_request_size == 0 {
            errors.push("server.max_request_size must be greater than 0".to_string());
        }

        for origin in &self.cors.allowed_origins {
            if origin.parse::<axum::http::HeaderValue>().is_err() || origin == "*" {
                errors.push(format!("cors.allowed_origins has invalid origin: {}", origin));
            }
        }

        for header in self.cors.allowed_headers.iter().chain(&self.cors.exposed_headers) {
            if header.parse::<axum::http::HeaderName>().is_err() {
                errors.push(format!("cors has invalid header name: {}", header));
            }
        }

        if !(0.0..=1.0).contains(&self.simulation.payment_failure_rate) {
            errors.push(format!(
                "simulation.payment_failure_rate must be between 0.0 and 1.0, got: {}",
                self.simulation.payment_failure_rate
            ));
        }

        if !(0.0..=MAX_LATENCY_SCALE).contains(&self.simulation.latency_scale) {
            errors.push(format!(
                "simulation.latency_scale must be between 0 and {}, got: {}",
                MAX_LATENCY_SCALE, self.simulation.latency_scale
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.observability.logging.level) {
            errors.push(format!(
                "Invalid log level '{}': {}",
                self.observability.logging.level, e
            ));
        }

        let tracing = &self.observability.tracing;
        if tracing.service_name.is_empty() {
            errors.push("observability.tracing.service_name cannot be empty".to_string());
        }

        if !(0.0..=1.0).contains(&tracing.sample_rate) {
            errors.push(format!(
                "Tracing sample_rate must be between 0.0 and 1.0, got: {}",
                tracing.sample_rate
            ));
        }

        if tracing.batch.max_queue_size == 0 || tracing.batch.max_export_batch_size == 0 {
            errors.push("Tracing batch sizes must be greater than 0".to_string());
        } else if tracing.batch.max_export_batch_size > tracing.batch.max_queue_size {
            errors.push(format!(
                "Tracing max_export_batch_size ({}) cannot exceed max_queue_size ({})",
                tracing.batch.max_export_batch_size, tracing.batch.max_queue_size
            ));
        }

        if let Some(endpoint) = &tracing.otlp_endpoint {
            if url::Url::parse(endpoint).is_err() {
                errors.push(format!("Invalid OTLP endpoint: {}", endpoint));
            }
        }

        if !self.observability.metrics.endpoint.starts_with('/') {
            errors.push(format!(
                "observability.metrics.endpoint must start with '/', got: {}",
                self.observability.metrics.endpoint
            ));
        }

        if !errors.is_empty() {
            return Err(StoreError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }

    /// Socket address string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server bind address
    pub bind_address: String,

    /// HTTP port
    pub port: u16,

    /// Requests running longer than this are answered with 408
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3001,
            request_timeout: Duration::from_secs(30),
            max_request_size: 1024 * 1024,
        }
    }
}

/// CORS policy. The trace headers must be both allowed and exposed, otherwise
/// the browser strips `traceparent` and client and server spans never join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
            allowed_headers: vec![
                "content-type".to_string(),
                "authorization".to_string(),
                "traceparent".to_string(),
                "tracestate".to_string(),
            ],
            exposed_headers: vec!["traceparent".to_string(), "tracestate".to_string()],
        }
    }
}

/// Simulated latency and failure injection for the mock backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Multiplier applied to every simulated delay (0 disables them)
    pub latency_scale: f64,

    /// Probability that the payment gateway declines a charge
    pub payment_failure_rate: f64,

    /// Time the payment gateway takes to answer
    #[serde(with = "humantime_serde")]
    pub payment_latency: Duration,

    /// Gateway name reported on payment spans
    pub payment_gateway: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_scale: 1.0,
            payment_failure_rate: 0.05,
            payment_latency: Duration::from_millis(100),
            payment_gateway: "stripe".to_string(),
        }
    }
}

impl SimulationConfig {
    /// No delays and no declines; what the test-suites run with
    pub fn instant() -> Self {
        Self {
            latency_scale: 0.0,
            payment_failure_rate: 0.0,
            ..Self::default()
        }
    }

    /// Scale a nominal delay by `latency_scale`
    pub fn scaled(&self, base: Duration) -> Duration {
        scale_duration(base, self.latency_scale)
    }
}

/// `base * scale`, saturating at `Duration::MAX`; NaN and negative scales give zero
pub fn scale_duration(base: Duration, scale: f64) -> Duration {
    if scale.is_nan() || scale <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() * scale).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_address(), "0.0.0.0:3001");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  port: 4000
simulation:
  payment_failure_rate: 0.3
  payment_latency: 250ms
observability:
  tracing:
    console_exporter: true
    batch:
      scheduled_delay: 1s
"#;
        let config = StoreConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.simulation.payment_latency, Duration::from_millis(250));
        assert!(config.observability.tracing.console_exporter);
        assert_eq!(config.observability.tracing.batch.scheduled_delay, Duration::from_secs(1));
        assert_eq!(config.observability.tracing.batch.max_queue_size, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("CHICCLOSET_LOG_FORMAT", "text"),
            ("CHICCLOSET_TRACING_ENABLED", "false"),
            ("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT", ""),
            ("CHICCLOSET_LATENCY_SCALE", "0.5"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.observability.logging.format, LogFormat::Text);
        assert!(!config.observability.tracing.enabled);
        assert_eq!(config.observability.tracing.otlp_endpoint, None);
        assert_eq!(config.simulation.latency_scale, 0.5);
    }

    #[test]
    fn test_bad_override_is_a_configuration_error() {
        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Configuration { .. }));
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut config = StoreConfig::default();
        config.server.port = 0;
        config.simulation.payment_failure_rate = 1.5;
        config.observability.tracing.batch.max_export_batch_size = 4096;
        config.observability.logging.level = "info,chiccloset=loud".to_string();

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("server.port"));
        assert!(message.contains("payment_failure_rate"));
        assert!(message.contains("max_export_batch_size"));
        assert!(message.contains("Invalid log level"));
    }

    #[test]
    fn test_scaled_latency() {
        let mut simulation = SimulationConfig::default();
        simulation.latency_scale = 0.5;
        assert_eq!(simulation.scaled(Duration::from_millis(40)), Duration::from_millis(20));
        assert_eq!(SimulationConfig::instant().scaled(Duration::from_millis(40)), Duration::ZERO);
    }

    #[test]
    fn test_huge_latency_scale() {
        let mut config = StoreConfig::default();
        config.simulation.latency_scale = 1e30;
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("simulation.latency_scale must be between 0 and 1000"));

        config.simulation.latency_scale = f64::NAN;
        assert!(config.validate().is_err());

        // scaling itself never panics, whatever got past validation
        assert_eq!(scale_duration(Duration::from_millis(30), 1e30), Duration::MAX);
        assert_eq!(scale_duration(Duration::from_millis(30), f64::INFINITY), Duration::MAX);
        assert_eq!(scale_duration(Duration::from_millis(30), f64::NAN), Duration::ZERO);
        assert_eq!(scale_duration(Duration::from_millis(30), -2.0), Duration::ZERO);
    }

    #[test]
    fn test_log_level_accepts_filter_directives() {
        let mut config = StoreConfig::default();
        config.observability.logging.level = "info,chiccloset=debug,tower_http=warn".to_string();
        assert!(config.validate().is_ok());

        config.observability.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }
}
