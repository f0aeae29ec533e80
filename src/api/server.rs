//! # Storefront API Server
//!
//! Builds the axum application and runs it.
//!
//! Layers, innermost first:
//! 1. request timeout (answers 408 so the server span still sees a status)
//! 2. request tracing ([`trace_requests`])
//! 3. `x-request-id` propagation, then generation
//! 4. CORS, outermost, so preflights never reach the handlers
//!
//! The body limit is applied through `DefaultBodyLimit`, which the `Json`
//! extractor honours.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::api::handlers;
use crate::api::middleware::trace_requests;
use crate::core::config::{CorsSettings, StoreConfig};
use crate::core::error::{StoreError, StoreResult};
use crate::observability::logging::REQUEST_ID_HEADER;
use crate::store::Store;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<StoreConfig>,
    /// Present when the Prometheus recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: StoreConfig, metrics: Option<PrometheusHandle>) -> Self {
        let store = Store::new(config.simulation.clone());
        Self::with_store(config, Arc::new(store), metrics)
    }

    pub fn with_store(config: StoreConfig, store: Arc<Store>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            metrics,
        }
    }
}

/// The storefront API server
pub struct StoreServer {
    state: AppState,
}

impl StoreServer {
    pub fn new(config: StoreConfig, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            state: AppState::new(config, metrics),
        }
    }

    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered application
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> StoreResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.state.config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| StoreError::config(format!("Failed to bind {}: {}", address, e)))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> StoreResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: SocketAddr = listener.local_addr()?;
        info!("🌐 ChicCloset API listening on http://{}", local_addr);
        log_endpoints(&self.state.config);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped accepting connections");
        Ok(())
    }
}

fn log_endpoints(config: &StoreConfig) {
    for (method, path) in [
        ("GET", "/health"),
        ("POST", "/api/auth/login"),
        ("GET", "/api/products"),
        ("GET", "/api/products/:id"),
        ("POST", "/api/orders"),
        ("GET", "/api/orders"),
        ("GET", "/api/orders/:id"),
        ("GET", "/api/debug/trace"),
    ] {
        info!("   {:<6} {}", method, path);
    }
    if config.observability.metrics.enabled {
        info!("   {:<6} {}", "GET", config.observability.metrics.endpoint);
    }
    if let Some(endpoint) = &config.observability.tracing.otlp_endpoint {
        info!("📊 Traces sent to: {}", endpoint);
    }
}

/// Assemble routes and layers around `state`
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut api = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/products", get(handlers::list_products))
        .route("/api/products/:id", get(handlers::get_product))
        .route("/api/orders", post(handlers::create_order).get(handlers::list_orders))
        .route("/api/orders/:id", get(handlers::get_order))
        .route("/api/debug/trace", get(handlers::debug_trace));

    if config.observability.metrics.enabled {
        api = api.route(&config.observability.metrics.endpoint, get(handlers::metrics));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // ServiceBuilder applies layers outermost first
    let middleware = ServiceBuilder::new()
        .layer(cors_layer(&config.cors))
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(from_fn_with_state(state.clone(), trace_requests))
        .layer(TimeoutLayer::new(config.server.request_timeout));

    api.fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.server.max_request_size))
        .layer(middleware)
        .with_state(state)
}

/// CORS policy letting the browser send and read the trace headers
pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    let parse_headers = |names: &[String]| -> Vec<HeaderName> {
        names.iter().filter_map(|name| name.parse().ok()).collect()
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(parse_headers(&settings.allowed_headers))
        .expose_headers(parse_headers(&settings.exposed_headers))
        .allow_credentials(settings.allow_credentials)
}
