//! # Structured Logging
//!
//! Correlation ids, PII masking and the per-request completion line.
//!
//! Log output itself is configured in [`crate::observability::tracing::init_telemetry`]:
//! the JSON formatter prints the current span's fields with every event, which
//! is how log lines pick up the request id and trace context.

use axum::http::HeaderMap;
use std::time::Duration;
use uuid::Uuid;

/// Header carrying the request id set by the request-id middleware
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID for tracking requests across services
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Reuse the request id from `x-request-id`, or mint a fresh one
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .unwrap_or_default()
    }

    /// Get the correlation ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keep the domain, hide the local part: `demo@chiccloset.com` → `d***@chiccloset.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

/// `✅ traced` when the caller sent trace context, `⚠️ not traced` otherwise
pub fn trace_marker(traced: bool) -> &'static str {
    if traced {
        "✅ traced"
    } else {
        "⚠️ not traced"
    }
}

/// Human-readable request summary: `GET /api/products - 200 (12ms) ✅ traced`
pub fn request_summary(method: &str, path: &str, status: u16, elapsed: Duration, traced: bool) -> String {
    format!(
        "{} {} - {} ({}ms) {}",
        method,
        path,
        status,
        elapsed.as_millis(),
        trace_marker(traced)
    )
}

/// Emit the completion line for a request, at a level matching its status
pub fn log_request_completion(
    method: &str,
    path: &str,
    status: u16,
    elapsed: Duration,
    traced: bool,
    request_id: &CorrelationId,
) {
    let summary = request_summary(method, path, status, elapsed, traced);
    let duration_ms = elapsed.as_millis() as u64;

    if status >= 500 {
        tracing::error!(
            http.method = %method,
            http.path = %path,
            http.status_code = status,
            duration_ms,
            traced,
            request_id = %request_id,
            "{}",
            summary
        );
    } else if status >= 400 {
        tracing::warn!(
            http.method = %method,
            http.path = %path,
            http.status_code = status,
            duration_ms,
            traced,
            request_id = %request_id,
            "{}",
            summary
        );
    } else {
        tracing::info!(
            http.method = %method,
            http.path = %path,
            http.status_code = status,
            duration_ms,
            traced,
            request_id = %request_id,
            "{}",
            summary
        );
    }
}
