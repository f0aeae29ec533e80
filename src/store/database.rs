//! Simulated database: every query is a traced span with an artificial delay.

use std::time::Duration;

use tracing::{info, Instrument};

use crate::core::config::SimulationConfig;
use crate::observability::tracing::mark_ok;

pub const DB_SYSTEM: &str = "postgresql";
pub const DB_NAME: &str = "chiccloset_db";

/// Stand-in for the shop's database
#[derive(Debug, Clone)]
pub struct Database {
    simulation: SimulationConfig,
}

impl Database {
    pub fn new(simulation: SimulationConfig) -> Self {
        Self { simulation }
    }

    /// Run the named query (`query.users`, `insert.order`, ...) under a
    /// `database.{name}` span, taking `base_latency` scaled by `latency_scale`.
    pub async fn query(&self, name: &str, base_latency: Duration) {
        let span = crate::store_span!(
            "database.query",
            otel.name = %format!("database.{}", name),
            db.system = DB_SYSTEM,
            db.operation = operation(name),
            db.name = DB_NAME,
            db.table = table(name)
        );
        let delay = self.simulation.scaled(base_latency);

        async {
            tokio::time::sleep(delay).await;
            info!(query.duration_ms = delay.as_millis() as u64, "query_executed");
        }
        .instrument(span.clone())
        .await;
        mark_ok(&span);
    }
}

/// `INSERT` for `insert.*` queries, `SELECT` for everything else
pub fn operation(name: &str) -> &'static str {
    if name.starts_with("insert.") {
        "INSERT"
    } else {
        "SELECT"
    }
}

/// Second dot-separated segment of the query name
pub fn table(name: &str) -> &str {
    name.split('.').nth(1).filter(|t| !t.is_empty()).unwrap_or("unknown")
}
