//! # Request Tracing Middleware
//!
//! Opens the server span for every request, parented on the W3C trace context
//! the caller sent, and closes it with the response status. The same pass
//! records request metrics and writes the completion log line.
//!
//! Paths listed in `observability.tracing.ignored_paths` (`/health` by default)
//! skip all of this.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, field, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::api::server::AppState;
use crate::observability::logging::{log_request_completion, CorrelationId};
use crate::observability::metrics::BusinessMetrics;
use crate::observability::tracing::{extract_context, mark_error, mark_ok};

pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Route label for requests no route matched, so unknown URLs share one series
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// `axum::middleware::from_fn_with_state` entry point
pub async fn trace_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if state.config.observability.tracing.is_ignored(&path) {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let request_id = CorrelationId::from_headers(request.headers());

    let traceparent = request
        .headers()
        .get(TRACEPARENT_HEADER)
        .and_then(|value| value.to_str().ok());
    let traced = traceparent.is_some();
    if let Some(traceparent) = traceparent {
        debug!("📥 {} {} - traceparent: {}", method, path, traceparent);
    }

    let span = crate::store_span!(
        "http.request",
        otel.name = %format!("HTTP {} {}", method, path),
        otel.kind = "server",
        http.method = %method,
        http.route = %route,
        http.target = %path,
        http.status_code = field::Empty,
        custom.request_id = %request_id
    );
    span.set_parent(extract_context(request.headers()));

    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let elapsed = started.elapsed();

    let status = response.status();
    span.record("http.status_code", status.as_u16());
    if status.is_server_error() {
        mark_error(&span, &format!("HTTP {}", status.as_u16()));
    } else {
        mark_ok(&span);
    }

    BusinessMetrics::record_request(&method, &route, status.as_u16(), elapsed);
    span.in_scope(|| {
        log_request_completion(&method, &path, status.as_u16(), elapsed, traced, &request_id)
    });

    response
}
