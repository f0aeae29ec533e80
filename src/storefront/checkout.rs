//! # Checkout
//!
//! The two checkout steps: shipping information (validated and traced as
//! `checkout.submit` → `checkout.validate`) and payment, which places the order
//! through the API and empties the cart.
//!
//! The demo scenarios hook in here: `slow-checkout` stalls validation and
//! `error` fails the information step at random with a support error id.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, field, info, warn, Instrument, Span};

use crate::core::config::{scale_duration, MAX_LATENCY_SCALE};
use crate::core::error::StoreError;
use crate::core::types::{CreateOrderRequest, Order, PaymentMethod, ShippingAddress};
use crate::observability::metrics::BusinessMetrics;
use crate::observability::tracing::{mark_error, mark_ok};
use crate::storefront::cart::Cart;
use crate::storefront::demo::{generate_error_id, should_simulate_error, DemoScenario};
use crate::storefront::pricing::{format_date, OrderTotals};
use crate::storefront::session::Session;
use crate::storefront::validators;

const DEFAULT_COUNTRY: &str = "United States";
const PAYMENT_ROUTE: &str = "/payment";

/// One invalid form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
    pub message: &'static str,
}

/// Field errors in form order; empty means the form is valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    fn check(&mut self, ok: bool, field: &'static str, code: &'static str, message: &'static str) {
        if !ok {
            self.errors.push(FieldError { field, code, message });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message for `field`, if it failed
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message)
    }

    /// Codes joined as `firstName_missing, email_invalid`
    pub fn codes(&self) -> String {
        self.errors.iter().map(|e| e.code).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s): {}", self.len(), self.codes())
    }
}

/// Shipping information step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl CheckoutForm {
    pub fn validate(&self) -> FormErrors {
        let present = |value: &str| !value.trim().is_empty();
        let mut errors = FormErrors::default();

        errors.check(present(&self.first_name), "firstName", "firstName_missing", "First name is required");
        errors.check(present(&self.last_name), "lastName", "lastName_missing", "Last name is required");
        errors.check(
            validators::validate_email(&self.email),
            "email",
            "email_invalid",
            "Please enter a valid email",
        );
        errors.check(
            validators::validate_phone(&self.phone),
            "phone",
            "phone_invalid",
            "Please enter a valid 10-digit phone number",
        );
        errors.check(present(&self.address), "address", "address_missing", "Address is required");
        errors.check(present(&self.city), "city", "city_missing", "City is required");
        errors.check(present(&self.state), "state", "state_missing", "State is required");
        errors.check(
            validators::validate_zip_code(&self.zip_code),
            "zipCode",
            "zipCode_invalid",
            "Please enter a valid ZIP code",
        );
        errors
    }

    pub fn to_address(&self) -> ShippingAddress {
        ShippingAddress {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// Card details on the payment step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub card_name: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl PaymentForm {
    /// Card fields are only checked for card payments
    pub fn validate(&self, method: PaymentMethod) -> FormErrors {
        let mut errors = FormErrors::default();
        if method == PaymentMethod::CashOnDelivery {
            return errors;
        }

        errors.check(
            !self.card_name.trim().is_empty(),
            "cardName",
            "cardName_missing",
            "Cardholder name is required",
        );
        errors.check(
            validators::validate_card_number(&self.card_number),
            "cardNumber",
            "cardNumber_invalid",
            "Please enter a valid 16-digit card number",
        );
        errors.check(
            validators::validate_expiry(&self.expiry_date),
            "expiryDate",
            "expiryDate_invalid",
            "Please enter a valid expiry date (MM/YY)",
        );
        errors.check(validators::validate_cvv(&self.cvv), "cvv", "cvv_invalid", "Please enter a valid CVV");
        errors
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Invalid(FormErrors),

    #[error("Payment processing failed (error id {error_id})")]
    PaymentFailed { error_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the order summary page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order: Order,
    pub totals: OrderTotals,
    pub placed_on: String,
}

/// One checkout, from the information step to the placed order
#[derive(Debug)]
pub struct Checkout {
    demo: Option<DemoScenario>,
    error_rate: f64,
    latency_scale: f64,
    started: Instant,
    shipping: Option<ShippingAddress>,
}

impl Checkout {
    pub fn new(demo: Option<DemoScenario>) -> Self {
        BusinessMetrics::checkout_started();
        let error_rate = demo
            .and_then(|scenario| scenario.config().error_rate)
            .unwrap_or(0.0);
        Self {
            demo,
            error_rate,
            latency_scale: 1.0,
            started: Instant::now(),
            shipping: None,
        }
    }

    /// Multiply demo delays; 0 removes them
    pub fn with_latency_scale(mut self, scale: f64) -> Self {
        self.latency_scale = if scale.is_nan() {
            0.0
        } else {
            scale.clamp(0.0, MAX_LATENCY_SCALE)
        };
        self
    }

    /// Override the failure rate of the `error` scenario
    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn shipping(&self) -> Option<&ShippingAddress> {
        self.shipping.as_ref()
    }

    fn demo_active(&self, scenario: DemoScenario) -> bool {
        self.demo == Some(scenario)
    }

    /// Validate the shipping form inside `checkout.validate`
    async fn validate(&self, form: &CheckoutForm) -> FormErrors {
        let span = crate::store_span!(
            "checkout.validate",
            validation.step = "checkout_form",
            demo.scenario = field::Empty,
            validation.errorCount = field::Empty,
            validation.passed = field::Empty,
            validation.errors = field::Empty
        );

        let errors = async {
            if self.demo_active(DemoScenario::SlowCheckout) {
                let delay = scale_duration(
                    DemoScenario::SlowCheckout.config().delay.unwrap_or(Duration::ZERO),
                    self.latency_scale,
                );
                Span::current().record("demo.scenario", DemoScenario::SlowCheckout.as_str());
                info!("simulating_slow_validation");
                warn!(demo.scenario = "slow-checkout", "🐢 DEMO: Simulating 3-second validation delay");
                tokio::time::sleep(delay).await;
                info!("slow_validation_completed");
            }

            let errors = form.validate();
            let current = Span::current();
            current.record("validation.errorCount", errors.len());
            current.record("validation.passed", errors.is_empty());

            if errors.is_empty() {
                info!("validation_passed");
                info!(form.fields = 9, "Checkout validation passed");
            } else {
                let codes = errors.codes();
                current.record("validation.errors", codes.as_str());
                info!(error.count = errors.len(), error.fields = %codes, "validation_failed");
                warn!(error.count = errors.len(), error.fields = %codes, "Checkout validation failed");
            }
            errors
        }
        .instrument(span.clone())
        .await;

        mark_ok(&span);
        errors
    }

    /// Information step: validate, remember the address, move on to payment
    pub async fn submit_information(&mut self, form: &CheckoutForm) -> Result<(), CheckoutError> {
        let span = crate::store_span!(
            "checkout.submit",
            checkout.step = "information",
            form.country = %form.country,
            submission.result = field::Empty,
            navigation.target = field::Empty,
            checkout.duration_ms = field::Empty,
            demo.scenario = field::Empty,
            error.id = field::Empty,
            "error.type" = field::Empty
        );

        let result = self.submit(form).instrument(span.clone()).await;
        match &result {
            Ok(()) => mark_ok(&span),
            Err(CheckoutError::Invalid(_)) => mark_error(&span, "Validation failed"),
            Err(CheckoutError::PaymentFailed { .. }) => {
                mark_error(&span, "Payment processing failed")
            }
            Err(e) => mark_error(&span, &e.to_string()),
        }
        result
    }

    async fn submit(&mut self, form: &CheckoutForm) -> Result<(), CheckoutError> {
        let span = Span::current();
        info!("submit_button_clicked");

        let errors = self.validate(form).await;
        if !errors.is_empty() {
            span.record("submission.result", "validation_failed");
            info!("submission_blocked_by_validation");
            error!(
                error.count = errors.len(),
                submission.result = "validation_failed",
                "Checkout submission failed - validation errors"
            );
            return Err(CheckoutError::Invalid(errors));
        }

        self.shipping = Some(form.to_address());
        info!("checkout_data_saved");

        if self.demo_active(DemoScenario::Error) {
            span.record("demo.scenario", DemoScenario::Error.as_str());
            if should_simulate_error(self.error_rate) {
                let error_id = generate_error_id();
                span.record("error.id", error_id.as_str());
                span.record("error.type", "payment_processing_failed");
                error!(
                    demo.scenario = "error",
                    error.id = %error_id,
                    error.code = "PAYMENT_DECLINED",
                    error.message = "Card was declined by payment processor",
                    "💥 DEMO: Payment processing failed"
                );
                return Err(CheckoutError::PaymentFailed { error_id });
            }
            info!("DEMO: Payment processed successfully (70% success rate)");
        }

        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        span.record("submission.result", "success");
        span.record("navigation.target", PAYMENT_ROUTE);
        span.record("checkout.duration_ms", elapsed_ms);
        info!("navigating_to_payment");
        info!(
            navigation.target = PAYMENT_ROUTE,
            checkout.duration_ms = elapsed_ms,
            "✅ Checkout submitted successfully"
        );
        Ok(())
    }

    /// Payment step: place the cart as an order and empty the cart
    pub async fn place_order(
        &mut self,
        cart: &mut Cart,
        session: &Session,
        method: PaymentMethod,
        payment: &PaymentForm,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let span = crate::store_span!(
            "checkout.placeOrder",
            payment.method = method.as_str(),
            cart.itemCount = cart.items().len(),
            order.id = field::Empty,
            order.total = field::Empty
        );

        let result = async {
            let errors = payment.validate(method);
            if !errors.is_empty() {
                info!(error.fields = %errors.codes(), "payment_validation_failed");
                return Err(CheckoutError::Invalid(errors));
            }

            let user = session
                .user()
                .ok_or_else(|| StoreError::validation("user", "Please log in to place an order"))?;
            let shipping_address = self
                .shipping
                .clone()
                .ok_or_else(|| StoreError::validation("shippingAddress", "Shipping information is required"))?;
            if cart.is_empty() {
                return Err(StoreError::validation("items", "Your cart is empty").into());
            }

            let totals = OrderTotals::from_subtotal(cart.total());
            let request = CreateOrderRequest {
                user_id: user.id,
                items: cart.order_items(),
                shipping_address,
                payment_method: method,
            };

            info!(order.total = totals.total, "submitting_order");
            let order = session.client().create_order(&request).await?;

            let current = Span::current();
            current.record("order.id", order.id);
            current.record("order.total", order.total);
            info!(order.id = order.id, "order_placed");

            BusinessMetrics::checkout_completed(method.as_str());
            BusinessMetrics::checkout_duration(self.started.elapsed());
            cart.clear();

            Ok(OrderConfirmation {
                placed_on: format_date(&chrono::Utc::now()),
                order,
                totals,
            })
        }
        .instrument(span.clone())
        .await;

        match &result {
            Ok(_) => mark_ok(&span),
            Err(e) => mark_error(&span, &e.to_string()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::client::StorefrontClient;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "(415) 555-0199".to_string(),
            address: "1 Market St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip_code: "94105".to_string(),
            ..CheckoutForm::default()
        }
    }

    fn card() -> PaymentForm {
        PaymentForm {
            card_name: "Ada Lovelace".to_string(),
            card_number: "4242 4242 4242 4242".to_string(),
            expiry_date: "09/27".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = CheckoutForm::default().validate();
        assert_eq!(errors.len(), 8);
        assert_eq!(
            errors.codes(),
            "firstName_missing, lastName_missing, email_invalid, phone_invalid, \
             address_missing, city_missing, state_missing, zipCode_invalid"
        );
        assert_eq!(errors.get("phone"), Some("Please enter a valid 10-digit phone number"));
        assert_eq!(CheckoutForm::default().country, "United States");
    }

    #[test]
    fn test_whitespace_only_names_are_missing() {
        let form = CheckoutForm {
            first_name: "   ".to_string(),
            ..valid_form()
        };
        let errors = form.validate();
        assert_eq!(errors.codes(), "firstName_missing");
        assert_eq!(errors.get("firstName"), Some("First name is required"));
    }

    #[test]
    fn test_payment_form() {
        assert!(card().validate(PaymentMethod::CreditCard).is_empty());
        assert!(PaymentForm::default()
            .validate(PaymentMethod::CashOnDelivery)
            .is_empty());

        let errors = PaymentForm::default().validate(PaymentMethod::DebitCard);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("expiryDate"), Some("Please enter a valid expiry date (MM/YY)"));
    }

    #[tokio::test]
    async fn test_submit_information_saves_address() {
        let mut checkout = Checkout::new(None);
        checkout.submit_information(&valid_form()).await.unwrap();
        assert_eq!(checkout.shipping().unwrap().city, "San Francisco");
    }

    #[tokio::test]
    async fn test_submit_information_blocks_invalid_form() {
        let mut checkout = Checkout::new(None);
        let form = CheckoutForm {
            zip_code: "941".to_string(),
            ..valid_form()
        };

        match checkout.submit_information(&form).await {
            Err(CheckoutError::Invalid(errors)) => assert_eq!(errors.codes(), "zipCode_invalid"),
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(checkout.shipping().is_none());
    }

    #[tokio::test]
    async fn test_error_scenario_fails_with_error_id() {
        let mut checkout = Checkout::new(Some(DemoScenario::Error)).with_error_rate(1.0);
        match checkout.submit_information(&valid_form()).await {
            Err(CheckoutError::PaymentFailed { error_id }) => assert!(error_id.starts_with("ERR-")),
            other => panic!("expected payment failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_checkout_delays_validation() {
        let mut checkout =
            Checkout::new(Some(DemoScenario::SlowCheckout)).with_latency_scale(0.01);
        let started = Instant::now();
        checkout.submit_information(&valid_form()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_latency_scale_is_bounded() {
        assert_eq!(Checkout::new(None).with_latency_scale(1e30).latency_scale, MAX_LATENCY_SCALE);
        assert_eq!(Checkout::new(None).with_latency_scale(-1.0).latency_scale, 0.0);
        assert_eq!(Checkout::new(None).with_latency_scale(f64::NAN).latency_scale, 0.0);
    }

    #[tokio::test]
    async fn test_place_order_requires_login() {
        let session = Session::new(StorefrontClient::new("http://127.0.0.1:9").unwrap());
        let mut checkout = Checkout::new(None);
        checkout.submit_information(&valid_form()).await.unwrap();

        let mut cart = Cart::new();
        let err = checkout
            .place_order(&mut cart, &session, PaymentMethod::CashOnDelivery, &PaymentForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Validation { .. })));
    }
}
