//! # ChicCloset Storefront - Shopper Journey
//!
//! Plays one shopper against a running API: login, browse, fill the cart,
//! check out, pay and look the order up again. Runs as its own service
//! (`chiccloset-storefront`), so the trace of the journey spans both processes.
//!
//! Environment:
//! - `STOREFRONT_API_URL`: API base URL (default `http://localhost:3001`)
//! - `STOREFRONT_DEMO`: demo scenario (`slow-checkout`, `slow-page`, `error`, `experiment`)
//! - `STOREFRONT_EMAIL` / `STOREFRONT_PASSWORD`: demo account to sign in with
//! - `OTEL_EXPORTER_OTLP_TRACES_ENDPOINT`: OTLP/HTTP traces endpoint, empty disables export

use anyhow::Context;
use tracing::{info, warn, Instrument};

use chiccloset::core::types::PaymentMethod;
use chiccloset::observability::config::{ObservabilityConfig, TracingConfig};
use chiccloset::observability::init_telemetry;
use chiccloset::observability::metrics::install_prometheus;
use chiccloset::observability::tracing::mark_ok;
use chiccloset::storefront::catalog::{self, SortOption};
use chiccloset::storefront::demo::{create_demo_trace, DemoScenario, ExperimentGroup};
use chiccloset::storefront::pricing::{format_currency, OrderTotals};
use chiccloset::storefront::{
    Cart, Checkout, CheckoutError, CheckoutForm, PaymentForm, Session, StorefrontClient,
};

const DEFAULT_API_URL: &str = "http://localhost:3001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let observability = storefront_observability();
    let telemetry = init_telemetry(&observability).context("failed to initialize telemetry")?;
    let metrics = install_prometheus(&observability.metrics)
        .map_err(|e| warn!(error = %e, "Metrics recorder not installed"))
        .ok();

    let api_url = env_or("STOREFRONT_API_URL", DEFAULT_API_URL);
    let demo = DemoScenario::from_param(std::env::var("STOREFRONT_DEMO").ok().as_deref());
    if let Some(scenario) = demo {
        let config = scenario.config();
        info!(demo.scenario = %scenario, "🎬 {}: {}", config.name, config.description);
    }

    let journey = chiccloset::store_span!("storefront.journey", api.url = %api_url);
    let outcome = shopper_journey(&api_url, demo).instrument(journey.clone()).await;
    if outcome.is_ok() {
        mark_ok(&journey);
    }
    drop(journey);

    let demo_trace = create_demo_trace().await;
    info!(trace_id = %demo_trace.trace_id, "🧪 Demo trace created");

    if let Some(handle) = metrics {
        tracing::debug!("📈 Storefront metrics\n{}", handle.render());
    }

    if let Err(e) = telemetry.shutdown().await {
        warn!(error = %e, "Telemetry shutdown failed");
    }
    outcome
}

async fn shopper_journey(api_url: &str, demo: Option<DemoScenario>) -> anyhow::Result<()> {
    let client = StorefrontClient::new(api_url)?;
    match client.health().await {
        Ok(health) => info!(status = %health.status, "API is up"),
        Err(e) => warn!(error = %e, "Health check failed, trying anyway"),
    }

    let trace = client.debug_trace().await.context("trace debug call failed")?;
    info!(traceparent = %trace.headers.traceparent, "{}", trace.note);

    // login
    let mut session = Session::new(client.clone());
    let email = env_or("STOREFRONT_EMAIL", "demo@chiccloset.com");
    let password = env_or("STOREFRONT_PASSWORD", "demo123");
    let user = session.login(&email, &password).await.context("login failed")?;
    info!("👋 Welcome, {}", user.name);

    // browse
    let products = client.products(None).await.context("failed to load products")?;
    if demo == Some(DemoScenario::SlowPage) {
        if let Some(delay) = DemoScenario::SlowPage.config().delay {
            warn!(demo.scenario = "slow-page", "🐢 DEMO: Simulating slow image loading");
            tokio::time::sleep(delay).await;
        }
    }
    if demo == Some(DemoScenario::Experiment) {
        let group = ExperimentGroup::assign();
        info!(experiment.group = group.as_str(), "🧪 Assigned to experiment group");
    }
    info!(categories = ?catalog::categories(&products), "Catalog loaded");

    let dresses = catalog::browse(&products, Some("Dresses"), Some(SortOption::Rating));
    let featured = client.product(products.first().map_or(1, |p| p.id)).await?;

    // cart
    let mut cart = Cart::new();
    for product in dresses.iter().take(2) {
        cart.add_item(product);
    }
    cart.add_item(&featured);
    cart.update_quantity(featured.id, 2);
    let totals = OrderTotals::from_subtotal(cart.total());
    info!(
        items = cart.count(),
        subtotal = %format_currency(totals.subtotal),
        shipping = %totals.shipping_label(),
        total = %format_currency(totals.total),
        "🛒 Cart ready"
    );

    // checkout
    let mut checkout = Checkout::new(demo);
    let form = CheckoutForm {
        first_name: "Fashion".to_string(),
        last_name: "Lover".to_string(),
        email: user.email.clone(),
        phone: "(415) 555-0199".to_string(),
        address: "1 Market St".to_string(),
        city: "San Francisco".to_string(),
        state: "CA".to_string(),
        zip_code: "94105".to_string(),
        ..CheckoutForm::default()
    };
    match checkout.submit_information(&form).await {
        Ok(()) => {}
        Err(CheckoutError::PaymentFailed { error_id }) => {
            warn!(error.id = %error_id, "❌ Payment Failed! Please contact support with this Error ID");
            session.logout();
            return Ok(());
        }
        Err(e) => return Err(e).context("checkout failed"),
    }

    // payment
    let card = PaymentForm {
        card_name: "Fashion Lover".to_string(),
        card_number: "4242 4242 4242 4242".to_string(),
        expiry_date: "09/27".to_string(),
        cvv: "123".to_string(),
    };
    let confirmation = checkout
        .place_order(&mut cart, &session, PaymentMethod::CreditCard, &card)
        .await
        .context("order placement failed")?;
    info!(
        order.id = confirmation.order.id,
        transaction.id = %confirmation.order.transaction_id,
        total = %format_currency(confirmation.order.total),
        placed_on = %confirmation.placed_on,
        "🎉 Order placed"
    );

    // order lookup
    let order = client.order(confirmation.order.id).await?;
    info!(order.id = order.id, status = order.status.as_str(), "📦 Order confirmed");

    session.logout();
    Ok(())
}

/// Storefront logging and tracing; the OTLP endpoint follows the standard variable
fn storefront_observability() -> ObservabilityConfig {
    let mut config = ObservabilityConfig {
        tracing: TracingConfig::storefront(),
        ..ObservabilityConfig::default()
    };
    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT") {
        config.tracing.otlp_endpoint = Some(endpoint).filter(|e| !e.is_empty());
    }
    if let Ok(level) = std::env::var("CHICCLOSET_LOG_LEVEL") {
        config.logging.level = level;
    }
    config
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
