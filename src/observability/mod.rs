// Core observability configuration
pub mod config;

// Request and business metrics
pub mod metrics;

// Structured logging
pub mod logging;

// Distributed tracing
pub mod tracing;

// Re-export commonly used types for convenience
pub use self::config::{LogConfig, LogFormat, ObservabilityConfig, TracingConfig};
pub use self::logging::CorrelationId;
pub use self::metrics::{BusinessMetrics, MetricsConfig};
pub use self::tracing::{init_telemetry, TelemetryGuard};
