//! # Storefront Client Tests
//!
//! The client against a `wiremock` API: request shapes, error mapping and the
//! W3C trace headers every call must carry.

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::json;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use wiremock::matchers::{body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chiccloset::core::error::StoreError;
use chiccloset::storefront::{Session, StorefrontClient};

/// Route spans through OpenTelemetry for the current thread.
///
/// The provider must outlive the test body, so it is handed back with the guard.
fn traced() -> (TracerProvider, DefaultGuard) {
    global::set_text_map_propagator(TraceContextPropagator::new());
    let provider = TracerProvider::builder().build();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("storefront-tests")));
    let guard = tracing::subscriber::set_default(subscriber);
    (provider, guard)
}

fn product_json(id: u32, name: &str, category: &str, price: f64) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "stock": 10,
        "category": category,
        "image": "https://images.unsplash.com/photo?w=500&h=500&fit=crop",
        "description": "",
        "rating": 4.5,
        "reviews": 10,
        "inStock": true
    })
}

/// Every call sends a traceparent header
#[tokio::test]
async fn test_requests_carry_traceparent() {
    let _telemetry = traced();
    let api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(header_exists("traceparent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "products": [product_json(1, "Floral Summer Dress", "Dresses", 89.99)]
        })))
        .expect(1)
        .mount(&api)
        .await;

    let client = StorefrontClient::new(&api.uri()).unwrap();
    let products = client.products(None).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Floral Summer Dress");
}

/// Category filter is sent as a query parameter
#[tokio::test]
async fn test_products_by_category() {
    let api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("category", "Shoes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "products": [product_json(6, "Leather Ankle Boots", "Shoes", 189.99)]
        })))
        .mount(&api)
        .await;

    let client = StorefrontClient::new(&api.uri()).unwrap();
    let shoes = client.products(Some("Shoes")).await.unwrap();
    assert_eq!(shoes[0].id, 6);
}

/// Error envelopes become `StoreError::Api` with the server's message
#[tokio::test]
async fn test_error_envelope_is_mapped() {
    let api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "Order not found"
        })))
        .mount(&api)
        .await;

    let client = StorefrontClient::new(&api.uri()).unwrap();
    match client.order(7).await {
        Err(StoreError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Order not found");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

/// Bodies that are not the error envelope fall back to the status text
#[tokio::test]
async fn test_error_without_envelope() {
    let api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&api)
        .await;

    let client = StorefrontClient::new(&api.uri()).unwrap();
    let err = client.orders().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Api { status: 503, ref message } if message == "Service Unavailable"
    ));
}

/// Session login posts the credentials and keeps the user and token
#[tokio::test]
async fn test_session_login() {
    let _telemetry = traced();
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(header_exists("traceparent"))
        .and(body_json(json!({ "email": "jane@example.com", "password": "password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": { "id": 2, "email": "jane@example.com", "name": "Jane Smith" },
            "token": "jwt_1760000000000_2"
        })))
        .expect(1)
        .mount(&api)
        .await;

    let mut session = Session::new(StorefrontClient::new(&api.uri()).unwrap());
    let user = session.login("jane@example.com", "password").await.unwrap();

    assert_eq!(user.name, "Jane Smith");
    assert!(session.is_authenticated());
    assert_eq!(session.token(), Some("jwt_1760000000000_2"));

    session.logout();
    assert!(!session.is_authenticated());
}

/// A rejected login leaves the session signed out
#[tokio::test]
async fn test_session_login_rejected() {
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid email or password"
        })))
        .mount(&api)
        .await;

    let mut session = Session::new(StorefrontClient::new(&api.uri()).unwrap());
    let err = session.login("demo@chiccloset.com", "wrong-pass").await.unwrap_err();

    assert!(matches!(err, StoreError::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "API error (401): Invalid email or password");
    assert!(!session.is_authenticated());
}
