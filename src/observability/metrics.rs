//! # Metrics Collection
//!
//! Request and business metrics recorded through the `metrics` facade and
//! exported in the Prometheus text format.
//!
//! Nothing here holds state: every function records into whatever recorder is
//! installed. The server installs the Prometheus recorder once at start-up and
//! serves its handle on `GET /metrics`; without a recorder the calls are no-ops,
//! which is what the storefront client and most tests run with.
//!
//! ## Usage Example
//! ```rust,ignore
//! use chiccloset::observability::metrics::BusinessMetrics;
//!
//! BusinessMetrics::cart_addition(3, "Bottoms", 2);
//! BusinessMetrics::payment_result("credit_card", true);
//! ```

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every metric name
const PREFIX: &str = "chiccloset";

/// Errors that can occur during metrics operations
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to initialize metrics exporter: {0}")]
    InitializationError(String),

    #[error("Invalid metric configuration: {0}")]
    ConfigurationError(String),
}

/// Configuration for metrics collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled
    pub enabled: bool,

    /// Prometheus metrics endpoint path
    pub endpoint: String,

    /// Histogram buckets (seconds) for latency metrics
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

fn name(metric: &str) -> String {
    format!("{}_{}", PREFIX, metric)
}

/// Build the Prometheus recorder without installing it globally
pub fn build_prometheus(config: &MetricsConfig) -> Result<PrometheusBuilder, MetricsError> {
    if config.latency_buckets.is_empty() {
        return Err(MetricsError::ConfigurationError(
            "latency_buckets cannot be empty".to_string(),
        ));
    }

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &config.latency_buckets,
        )
        .map_err(|e| MetricsError::ConfigurationError(e.to_string()))
}

/// Install the Prometheus recorder as the global `metrics` recorder.
///
/// Returns the handle used to render `GET /metrics`.
pub fn install_prometheus(config: &MetricsConfig) -> Result<PrometheusHandle, MetricsError> {
    let handle = build_prometheus(config)?
        .install_recorder()
        .map_err(|e| MetricsError::InitializationError(e.to_string()))?;

    describe_metrics();
    tracing::info!(endpoint = %config.endpoint, "Prometheus metrics recorder installed");
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(name("http_requests_total"), "HTTP requests served");
    metrics::describe_histogram!(
        name("http_request_duration_seconds"),
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    metrics::describe_counter!(name("cart_additions_total"), "Items added to carts");
    metrics::describe_counter!(name("cart_removals_total"), "Items removed from carts");
    metrics::describe_counter!(name("cart_abandonments_total"), "Carts cleared with items in them");
    metrics::describe_counter!(
        name("revenue_potential_cents_total"),
        "Value of items added to carts, in cents"
    );
    metrics::describe_counter!(name("login_attempts_total"), "Login attempts");
    metrics::describe_counter!(name("login_results_total"), "Login outcomes");
    metrics::describe_counter!(name("checkout_started_total"), "Checkouts started");
    metrics::describe_counter!(name("checkout_completed_total"), "Checkouts completed");
    metrics::describe_histogram!(
        name("checkout_duration_seconds"),
        metrics::Unit::Seconds,
        "Time from checkout start to order placement"
    );
    metrics::describe_counter!(name("orders_created_total"), "Orders placed");
    metrics::describe_histogram!(name("order_value_dollars"), "Order totals");
    metrics::describe_counter!(name("payments_total"), "Payment attempts by outcome");
    metrics::describe_gauge!(name("business_metric"), "Ad-hoc business measurements");
}

/// Business and request metrics
pub struct BusinessMetrics;

impl BusinessMetrics {
    /// One HTTP request served by the API
    pub fn record_request(method: &str, route: &str, status: u16, duration: Duration) {
        metrics::counter!(
            name("http_requests_total"),
            "method" => method.to_string(),
            "route" => route.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!(
            name("http_request_duration_seconds"),
            "method" => method.to_string(),
            "route" => route.to_string()
        )
        .record(duration.as_secs_f64());
    }

    pub fn cart_addition(product_id: u32, category: &str, quantity: u32) {
        metrics::counter!(
            name("cart_additions_total"),
            "product_id" => product_id.to_string(),
            "category" => category.to_string()
        )
        .increment(u64::from(quantity));
    }

    pub fn cart_removal(product_id: u32, quantity: u32) {
        metrics::counter!(
            name("cart_removals_total"),
            "product_id" => product_id.to_string()
        )
        .increment(u64::from(quantity));
    }

    /// A cart was cleared while it still held items
    pub fn cart_abandonment(item_count: u32, value: f64) {
        metrics::counter!(name("cart_abandonments_total")).increment(1);
        tracing::debug!(item_count, value, "cart abandoned");
    }

    /// Value added to a cart. Counters are integral, so this is kept in cents.
    pub fn revenue_potential(amount: f64) {
        if amount > 0.0 {
            metrics::counter!(name("revenue_potential_cents_total"))
                .increment(to_cents(amount));
        }
    }

    pub fn login_attempt() {
        metrics::counter!(name("login_attempts_total")).increment(1);
    }

    pub fn login_result(success: bool) {
        metrics::counter!(name("login_results_total"), "result" => outcome(success)).increment(1);
    }

    pub fn checkout_started() {
        metrics::counter!(name("checkout_started_total")).increment(1);
    }

    pub fn checkout_completed(payment_method: &str) {
        metrics::counter!(
            name("checkout_completed_total"),
            "payment_method" => payment_method.to_string()
        )
        .increment(1);
    }

    pub fn checkout_duration(duration: Duration) {
        metrics::histogram!(name("checkout_duration_seconds")).record(duration.as_secs_f64());
    }

    pub fn order_created(payment_method: &str, total: f64) {
        metrics::counter!(
            name("orders_created_total"),
            "payment_method" => payment_method.to_string()
        )
        .increment(1);
        metrics::histogram!(name("order_value_dollars")).record(total);
    }

    pub fn payment_result(method: &str, approved: bool) {
        metrics::counter!(
            name("payments_total"),
            "method" => method.to_string(),
            "result" => outcome(approved)
        )
        .increment(1);
    }

    /// Free-form measurement, exposed as a labelled gauge
    pub fn gauge(metric: &str, value: f64, unit: &str) {
        metrics::gauge!(
            name("business_metric"),
            "name" => metric.to_string(),
            "unit" => unit.to_string()
        )
        .set(value);
    }
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

fn to_cents(amount: f64) -> u64 {
    (amount * 100.0).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce()>(f: F) -> String {
        let recorder = build_prometheus(&MetricsConfig::default())
            .unwrap()
            .build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, f);
        handle.render()
    }

    #[test]
    fn test_request_metrics_are_labelled() {
        let output = render(|| {
            BusinessMetrics::record_request("GET", "/api/products", 200, Duration::from_millis(12));
        });

        assert!(output.contains("chiccloset_http_requests_total"));
        assert!(output.contains("route=\"/api/products\""));
        assert!(output.contains("status=\"200\""));
        assert!(output.contains("chiccloset_http_request_duration_seconds_bucket"));
    }

    #[test]
    fn test_revenue_is_counted_in_cents() {
        let output = render(|| {
            BusinessMetrics::revenue_potential(89.99);
            BusinessMetrics::revenue_potential(10.01);
            BusinessMetrics::revenue_potential(-5.0);
        });

        assert!(output.contains("chiccloset_revenue_potential_cents_total 10000"));
    }

    #[test]
    fn test_login_results_split_by_outcome() {
        let output = render(|| {
            BusinessMetrics::login_attempt();
            BusinessMetrics::login_result(true);
            BusinessMetrics::login_result(false);
            BusinessMetrics::login_result(false);
        });

        assert!(output.contains("chiccloset_login_results_total{result=\"failure\"} 2"));
        assert!(output.contains("chiccloset_login_results_total{result=\"success\"} 1"));
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            latency_buckets: Vec::new(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            build_prometheus(&config),
            Err(MetricsError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(129.99), 12999);
        assert_eq!(to_cents(0.0), 0);
    }
}
