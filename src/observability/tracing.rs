//! # Distributed Tracing
//!
//! OpenTelemetry wiring for both processes (API server and storefront client)
//! plus the small span toolkit the rest of the crate is written against.
//!
//! ## Pipeline
//! `tracing` spans → `tracing-opentelemetry` layer → SDK `TracerProvider`
//! (parent-based ratio sampler, service resource) → `BatchSpanProcessor` on the
//! Tokio runtime → OTLP/HTTP exporter and/or stdout exporter.
//!
//! Context crosses the network as W3C `traceparent`/`tracestate` headers: the
//! storefront client injects them (`inject_current_context`), the API server
//! extracts them (`extract_context`) and parents its server span on the result,
//! so both halves of a request land in one trace.
//!
//! ## Span fields
//! `tracing` only records fields declared when the span is created, so every
//! span built here declares its status fields up front (see [`store_span!`]).
//! Callers of [`set_user_context`] must declare `user.id` and `user.email`.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;

use axum::http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{TraceContextExt, TracerProvider as _};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchConfig, BatchSpanProcessor, Config, Sampler, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing::{info, warn, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::core::error::{StoreError, StoreResult};
use crate::core::types::ActiveSpanInfo;
use crate::observability::config::{BatchSettings, LogFormat, ObservabilityConfig, TracingConfig};
use crate::observability::metrics::BusinessMetrics;

/// Instrumentation scope name reported on every span
pub const INSTRUMENTATION_NAME: &str = "chiccloset";

/// Build an info-level span with the OpenTelemetry status fields declared.
///
/// ```rust,ignore
/// let span = store_span!("inventory.check", product.id = id, inventory.available = tracing::field::Empty);
/// ```
#[macro_export]
macro_rules! store_span {
    ($name:expr $(, $($fields:tt)+)?) => {
        ::tracing::info_span!(
            $name,
            otel.status_code = ::tracing::field::Empty,
            otel.status_message = ::tracing::field::Empty
            $(, $($fields)+)?
        )
    };
}

/// Keeps the tracer provider alive; call [`TelemetryGuard::shutdown`] before exit
/// so batched spans are flushed.
#[must_use = "dropping the guard without shutdown loses buffered spans"]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    /// Whether an OpenTelemetry pipeline was installed
    pub fn is_tracing(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush pending spans and shut the provider down.
    ///
    /// The SDK's shutdown blocks on the exporter, so it runs on the blocking pool.
    /// Both the global handle and this guard's handle are released there; the
    /// last one dropped is what triggers the processor shutdown.
    pub async fn shutdown(mut self) -> StoreResult<()> {
        let Some(provider) = self.provider.take() else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || {
            for result in provider.force_flush() {
                if let Err(e) = result {
                    warn!(error = %e, "Span flush failed");
                }
            }
            global::shutdown_tracer_provider();
            drop(provider);
        })
        .await
        .map_err(|e| StoreError::telemetry(format!("tracer shutdown failed: {}", e)))?;
        info!("Tracer provider shut down, spans flushed");
        Ok(())
    }
}

/// Install logging and tracing for this process.
///
/// Must run inside a Tokio runtime: the batch processors spawn their export
/// tasks on it. A second call keeps the first subscriber and only warns.
pub fn init_telemetry(config: &ObservabilityConfig) -> StoreResult<TelemetryGuard> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| StoreError::telemetry(format!("invalid log filter: {}", e)))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Text => fmt::layer().with_target(false).boxed(),
    };

    let provider = if config.tracing.enabled {
        Some(build_provider(&config.tracing)?)
    } else {
        None
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(INSTRUMENTATION_NAME))
    });

    if let Some(provider) = &provider {
        global::set_tracer_provider(provider.clone());
    }

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .with(otel_layer)
        .with(filter)
        .try_init()
        .is_err()
    {
        warn!("Tracing subscriber already initialized, keeping the existing one");
    }

    let tracing = &config.tracing;
    if provider.is_some() {
        info!(
            service = %tracing.service_name,
            version = %tracing.service_version,
            otlp_endpoint = ?tracing.otlp_endpoint,
            console_exporter = tracing.console_exporter,
            sample_rate = tracing.sample_rate,
            "🔭 OpenTelemetry tracing initialized"
        );
    } else {
        info!("Distributed tracing is disabled");
    }

    Ok(TelemetryGuard { provider })
}

/// Service identity attached to every span
pub fn service_resource(config: &TracingConfig) -> Resource {
    Resource::default().merge(&Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("service.namespace", config.service_namespace.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]))
}

/// Build the SDK provider with the configured exporters
pub fn build_provider(config: &TracingConfig) -> StoreResult<TracerProvider> {
    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(config.sample_rate)));
    let mut builder = TracerProvider::builder().with_config(
        Config::default()
            .with_resource(service_resource(config))
            .with_sampler(sampler),
    );

    if let Some(endpoint) = &config.otlp_endpoint {
        use opentelemetry_otlp::WithExportConfig;

        // the exporter appends the signal path itself
        let base = endpoint.trim_end_matches('/').trim_end_matches("/v1/traces");
        let exporter = opentelemetry_otlp::new_exporter()
            .http()
            .with_endpoint(base)
            .with_timeout(config.batch.export_timeout)
            .build_span_exporter()
            .map_err(|e| StoreError::telemetry(format!("failed to build OTLP exporter: {}", e)))?;
        builder = builder.with_span_processor(batch_processor(exporter, &config.batch));
    }

    if config.console_exporter {
        let exporter = opentelemetry_stdout::SpanExporter::default();
        builder = builder.with_span_processor(batch_processor(exporter, &config.batch));
    }

    Ok(builder.build())
}

fn batch_processor<E>(exporter: E, batch: &BatchSettings) -> BatchSpanProcessor<runtime::Tokio>
where
    E: SpanExporter + 'static,
{
    let batch_config = BatchConfig::default()
        .with_max_queue_size(batch.max_queue_size)
        .with_scheduled_delay(batch.scheduled_delay)
        .with_max_export_timeout(batch.export_timeout)
        .with_max_export_batch_size(batch.max_export_batch_size);

    BatchSpanProcessor::builder(exporter, runtime::Tokio)
        .with_batch_config(batch_config)
        .build()
}

/// Set the span status to OK
pub fn mark_ok(span: &Span) {
    span.record("otel.status_code", "OK");
}

/// Set the span status to ERROR and attach the failure as an exception event
pub fn mark_error(span: &Span, message: &str) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", message);
    tracing::warn!(parent: span, exception.message = %message, "exception");
}

/// Run a future inside `span`, closing it with OK or ERROR depending on the result
pub async fn in_span<F, T, E>(span: Span, work: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let result = work.instrument(span.clone()).await;
    match &result {
        Ok(_) => mark_ok(&span),
        Err(e) => mark_error(&span, &e.to_string()),
    }
    result
}

/// Synchronous counterpart of [`in_span`]
pub fn in_span_sync<F, T, E>(span: Span, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    let result = span.in_scope(work);
    match &result {
        Ok(_) => mark_ok(&span),
        Err(e) => mark_error(&span, &e.to_string()),
    }
    result
}

/// Attach the signed-in user to a span that declared `user.id` and `user.email`
pub fn set_user_context(span: &Span, user_id: u32, email: &str) {
    span.record("user.id", user_id);
    span.record("user.email", email);
}

/// Record a business measurement as an event on the current span and as a gauge
pub fn record_business_metric(name: &str, value: f64, unit: &str) {
    tracing::info!(
        metric.name = %name,
        metric.value = value,
        metric.unit = %unit,
        "business_metric"
    );
    BusinessMetrics::gauge(name, value, unit);
}

/// Read-only view of axum request headers for the W3C propagator
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

/// Remote parent context carried by incoming request headers
pub fn extract_context(headers: &HeaderMap) -> opentelemetry::Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Trace headers for an outgoing call made from inside `span`
pub fn inject_context(span: &Span) -> HashMap<String, String> {
    let context = span.context();
    let mut carrier = HashMap::new();
    global::get_text_map_propagator(|propagator| propagator.inject_context(&context, &mut carrier));
    carrier
}

/// Trace headers for an outgoing call made from the current span
pub fn inject_current_context() -> HashMap<String, String> {
    inject_context(&Span::current())
}

/// W3C headers without going through the global propagator
pub fn traceparent_headers(span: &Span) -> HashMap<String, String> {
    let mut carrier = HashMap::new();
    TraceContextPropagator::new().inject_context(&span.context(), &mut carrier);
    carrier
}

/// Identifiers of the current span, all zeros when no tracer is installed
pub fn current_trace_ids() -> ActiveSpanInfo {
    let context = Span::current().context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    ActiveSpanInfo {
        trace_id: format!("{:032x}", u128::from_be_bytes(span_context.trace_id().to_bytes())),
        span_id: format!("{:016x}", u64::from_be_bytes(span_context.span_id().to_bytes())),
        trace_flags: span_context.trace_flags().to_u8(),
    }
}
