//! # Payment Processing
//!
//! The shop charges through a [`PaymentGateway`]. The only implementation is
//! [`SimulatedGateway`], which waits a fixed latency and declines a configurable
//! share of charges at random; tests pin the failure rate to 0 or 1.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{field, info, Instrument};

use crate::core::config::SimulationConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::ids;
use crate::core::types::PaymentMethod;
use crate::observability::metrics::BusinessMetrics;
use crate::observability::tracing::{mark_error, mark_ok};

/// Reason returned to the shopper for any decline
pub const DECLINE_REASON: &str = "Payment declined by gateway";

/// What the gateway said about a charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// A payment provider the shop can charge through
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider name reported on payment spans
    fn name(&self) -> &str;

    /// Attempt to charge `amount` dollars
    async fn charge(&self, amount: f64, method: PaymentMethod) -> PaymentOutcome;
}

/// Random-decline gateway used by the demo
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    pub name: String,
    pub failure_rate: f64,
    pub latency: Duration,
}

impl SimulatedGateway {
    pub fn from_config(simulation: &SimulationConfig) -> Self {
        Self {
            name: simulation.payment_gateway.clone(),
            failure_rate: simulation.payment_failure_rate,
            latency: simulation.scaled(simulation.payment_latency),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn charge(&self, _amount: f64, _method: PaymentMethod) -> PaymentOutcome {
        tokio::time::sleep(self.latency).await;

        let declined = rand::thread_rng().gen_bool(self.failure_rate.clamp(0.0, 1.0));
        if declined {
            PaymentOutcome::Declined {
                reason: DECLINE_REASON.to_string(),
            }
        } else {
            PaymentOutcome::Approved {
                transaction_id: ids::transaction_id(),
            }
        }
    }
}

/// Charge through `gateway` under a `payment.process` span.
///
/// Returns the transaction id, or `PaymentDeclined` carrying the gateway's reason.
pub async fn process_payment(
    gateway: &dyn PaymentGateway,
    amount: f64,
    method: PaymentMethod,
) -> StoreResult<String> {
    let span = crate::store_span!(
        "payment.process",
        payment.amount = amount,
        payment.method = method.as_str(),
        payment.gateway = field::Empty,
        payment.transaction_id = field::Empty
    );
    span.record("payment.gateway", gateway.name());

    let outcome = async {
        info!("payment_initiated");
        let outcome = gateway.charge(amount, method).await;
        match &outcome {
            PaymentOutcome::Approved { transaction_id } => {
                info!(transaction_id = %transaction_id, "payment_successful")
            }
            PaymentOutcome::Declined { reason } => info!(reason = %reason, "payment_failed"),
        }
        outcome
    }
    .instrument(span.clone())
    .await;

    match outcome {
        PaymentOutcome::Approved { transaction_id } => {
            span.record("payment.transaction_id", transaction_id.as_str());
            mark_ok(&span);
            BusinessMetrics::payment_result(method.as_str(), true);
            Ok(transaction_id)
        }
        PaymentOutcome::Declined { reason } => {
            mark_error(&span, "Payment declined");
            BusinessMetrics::payment_result(method.as_str(), false);
            Err(StoreError::PaymentDeclined { reason })
        }
    }
}
