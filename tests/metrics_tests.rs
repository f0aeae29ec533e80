//! # Metrics Endpoint Tests
//!
//! Installs the global Prometheus recorder, so this suite lives in its own
//! test binary and shares one recorder between its tests.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum_test::TestServer;
use metrics_exporter_prometheus::PrometheusHandle;

use chiccloset::core::config::{SimulationConfig, StoreConfig};
use chiccloset::observability::metrics::install_prometheus;
use chiccloset::{build_router, AppState};

fn recorder() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| install_prometheus(&StoreConfig::default().observability.metrics).unwrap())
        .clone()
}

fn metered_server() -> TestServer {
    let config = StoreConfig {
        simulation: SimulationConfig::instant(),
        ..StoreConfig::default()
    };
    let state = AppState::new(config, Some(recorder()));
    TestServer::new(build_router(state)).unwrap()
}

fn request_count(rendered: &str, labels: &str) -> Option<u64> {
    let series = format!("chiccloset_http_requests_total{{{}}} ", labels);
    rendered
        .lines()
        .find_map(|line| line.strip_prefix(series.as_str()))
        .and_then(|value| value.trim().parse().ok())
}

/// Unknown URLs are counted under one route label instead of their raw path
#[tokio::test]
async fn test_unknown_paths_share_one_series() {
    let server = metered_server();

    for path in ["/wp-admin/setup.php", "/.env", "/api/wishlist"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    let rendered = server.get("/metrics").await.text();
    assert_eq!(
        request_count(&rendered, r#"method="GET",route="unmatched",status="404""#),
        Some(3)
    );
    assert!(!rendered.contains(r#"route="/.env""#));
    assert!(!rendered.contains(r#"route="/wp-admin/setup.php""#));
}

/// Matched routes are labelled with their template, not the concrete id
#[tokio::test]
async fn test_routes_use_templates() {
    let server = metered_server();

    server.get("/api/products/1").await;
    server.get("/api/products/2").await;

    let rendered = server.get("/metrics").await.text();
    assert_eq!(
        request_count(&rendered, r#"method="GET",route="/api/products/:id",status="200""#),
        Some(2)
    );
    assert!(!rendered.contains(r#"route="/api/products/1""#));
}
