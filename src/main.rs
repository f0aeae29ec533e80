//! # ChicCloset API - Main Entry Point
//!
//! Starts the storefront API server:
//!
//! 1. load configuration (`config/chiccloset.yaml` + environment overrides)
//! 2. install logging and OpenTelemetry tracing
//! 3. install the Prometheus recorder when metrics are enabled
//! 4. serve until SIGINT/SIGTERM, then drain connections
//! 5. flush buffered spans before exiting

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use chiccloset::core::config::StoreConfig;
use chiccloset::observability::init_telemetry;
use chiccloset::observability::metrics::install_prometheus;
use chiccloset::StoreServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StoreConfig::load()
        .await
        .context("failed to load configuration")?;

    let telemetry =
        init_telemetry(&config.observability).context("failed to initialize telemetry")?;

    info!("🚀 Starting ChicCloset API");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let metrics = if config.observability.metrics.enabled {
        match install_prometheus(&config.observability.metrics) {
            Ok(handle) => {
                info!("📈 Prometheus metrics enabled");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Metrics recorder not installed, continuing without metrics");
                None
            }
        }
    } else {
        None
    };

    let server = StoreServer::new(config, metrics);
    let served = server.serve(shutdown_signal()).await;

    if telemetry.is_tracing() {
        info!("🛑 Flushing telemetry...");
    }
    if let Err(e) = telemetry.shutdown().await {
        warn!(error = %e, "Telemetry shutdown failed");
    }

    served.context("server error")?;
    info!("✅ ChicCloset API shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        _ = terminate => info!("📡 Received SIGTERM, initiating graceful shutdown..."),
    }
}
