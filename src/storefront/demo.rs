//! Demo scenarios that make interesting traces on purpose: slow steps, random
//! payment failures and an A/B split.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{field, info, Instrument};

use crate::core::error::StoreError;
use crate::core::ids;
use crate::core::types::ActiveSpanInfo;
use crate::observability::tracing::{current_trace_ids, mark_ok};

/// Scenario selected with `?demo=` (or `STOREFRONT_DEMO`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoScenario {
    SlowCheckout,
    SlowPage,
    Error,
    Experiment,
}

impl DemoScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlowCheckout => "slow-checkout",
            Self::SlowPage => "slow-page",
            Self::Error => "error",
            Self::Experiment => "experiment",
        }
    }

    pub fn config(&self) -> DemoConfig {
        match self {
            Self::SlowCheckout => DemoConfig {
                name: "Scenario 1: Slow Checkout Validation",
                description: "Simulates 3-second delay in checkout validation",
                delay: Some(Duration::from_millis(3000)),
                error_rate: None,
                treatment_rate: None,
            },
            Self::SlowPage => DemoConfig {
                name: "Scenario 2: Slow Page Load",
                description: "Simulates slow image loading",
                delay: Some(Duration::from_millis(2000)),
                error_rate: None,
                treatment_rate: None,
            },
            Self::Error => DemoConfig {
                name: "Scenario 4: Payment Error",
                description: "30% chance of payment processing failure",
                delay: None,
                error_rate: Some(0.3),
                treatment_rate: None,
            },
            Self::Experiment => DemoConfig {
                name: "Scenario 5: A/B Test Experiment",
                description: "Splits users into control/treatment groups",
                delay: None,
                error_rate: None,
                treatment_rate: Some(0.5),
            },
        }
    }

    /// Scenario from an optional query/env value; unknown names mean no scenario
    pub fn from_param(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| v.parse().ok())
    }
}

impl fmt::Display for DemoScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoScenario {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow-checkout" => Ok(Self::SlowCheckout),
            "slow-page" => Ok(Self::SlowPage),
            "error" => Ok(Self::Error),
            "experiment" => Ok(Self::Experiment),
            other => Err(StoreError::validation("demo", format!("Unknown demo scenario: {}", other))),
        }
    }
}

/// Knobs of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoConfig {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(with = "humantime_serde")]
    pub delay: Option<Duration>,
    pub error_rate: Option<f64>,
    pub treatment_rate: Option<f64>,
}

/// True with probability `rate`
pub fn should_simulate_error(rate: f64) -> bool {
    rand::thread_rng().gen::<f64>() < rate
}

/// A/B test arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentGroup {
    Control,
    Treatment,
}

impl ExperimentGroup {
    /// Coin flip: above one half lands in control
    pub fn assign() -> Self {
        Self::from_roll(rand::thread_rng().gen::<f64>())
    }

    fn from_roll(roll: f64) -> Self {
        if roll > 0.5 {
            Self::Control
        } else {
            Self::Treatment
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Treatment => "treatment",
        }
    }
}

/// Error id shown to the shopper and attached to the failing span
pub fn generate_error_id() -> String {
    ids::error_id()
}

/// Emit a small three-span trace; returns the ids of its root span
pub async fn create_demo_trace() -> ActiveSpanInfo {
    let root = crate::store_span!("demo.trace", demo = true, trace.id = field::Empty);

    let ids = async {
        let ids = current_trace_ids();
        tracing::Span::current().record("trace.id", ids.trace_id.as_str());
        info!("demo_trace_started");

        demo_operation("demo.operation1", "first", Duration::from_millis(50)).await;
        demo_operation("demo.operation2", "second", Duration::from_millis(100)).await;

        info!("demo_trace_completed");
        ids
    }
    .instrument(root.clone())
    .await;

    mark_ok(&root);
    ids
}

async fn demo_operation(name: &'static str, operation: &'static str, duration: Duration) {
    let span = crate::store_span!("demo.operation", otel.name = name, operation = operation);
    tokio::time::sleep(duration).instrument(span.clone()).await;
    mark_ok(&span);
}
