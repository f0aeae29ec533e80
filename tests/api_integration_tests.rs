//! # API Integration Tests
//!
//! Drives the full router (routes, middleware, error envelope) in process with
//! `axum-test`. Simulated latency is switched off and the payment gateway never
//! declines unless a test says otherwise.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use chiccloset::core::config::{SimulationConfig, StoreConfig};
use chiccloset::core::types::{
    HealthResponse, LoginResponse, OrderResponse, OrderStatus, OrdersResponse, PaymentMethod,
    ProductResponse, ProductsResponse, TraceDebugResponse,
};
use chiccloset::store::{SimulatedGateway, Store};
use chiccloset::{build_router, AppState};

const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

fn test_config() -> StoreConfig {
    StoreConfig {
        simulation: SimulationConfig::instant(),
        ..StoreConfig::default()
    }
}

fn test_server() -> TestServer {
    let state = AppState::new(test_config(), None);
    TestServer::new(build_router(state)).unwrap()
}

fn declining_server() -> TestServer {
    let gateway = Arc::new(SimulatedGateway {
        name: "stripe".to_string(),
        failure_rate: 1.0,
        latency: Duration::ZERO,
    });
    let store = Store::with_gateway(SimulationConfig::instant(), gateway);
    let state = AppState::with_store(test_config(), Arc::new(store), None);
    TestServer::new(build_router(state)).unwrap()
}

fn order_body(items: Value) -> Value {
    json!({
        "userId": 1,
        "items": items,
        "shippingAddress": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phone": "4155550199",
            "address": "1 Market St",
            "city": "San Francisco",
            "state": "CA",
            "zipCode": "94105",
            "country": "United States"
        },
        "paymentMethod": "credit_card"
    })
}

/// Health check answers with a timestamp
#[tokio::test]
async fn test_health() {
    let server = test_server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
}

/// Demo account logs in and gets a session token
#[tokio::test]
async fn test_login_success() {
    let server = test_server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "demo@chiccloset.com", "password": "demo123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let login: LoginResponse = response.json();
    assert!(login.success);
    assert_eq!(login.user.name, "Fashion Lover");
    assert!(login.token.starts_with("jwt_"));
    assert!(login.token.ends_with("_1"));

    let raw: Value = response.json();
    assert!(raw["user"].get("password").is_none());
}

/// Wrong password and unknown email get the same 401
#[tokio::test]
async fn test_login_failure() {
    let server = test_server();

    for body in [
        json!({ "email": "demo@chiccloset.com", "password": "wrong" }),
        json!({ "email": "nobody@chiccloset.com", "password": "demo123" }),
    ] {
        let response = server.post("/api/auth/login").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let error: Value = response.json();
        assert_eq!(error["success"], false);
        assert_eq!(error["message"], "Invalid email or password");
    }
}

/// Malformed login bodies are rejected with the error envelope
#[tokio::test]
async fn test_login_rejects_malformed_body() {
    let server = test_server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "demo@chiccloset.com" }))
        .await;
    assert!(response.status_code().is_client_error());

    let error: Value = response.json();
    assert_eq!(error["success"], false);
}

/// Listing with and without a category filter
#[tokio::test]
async fn test_list_products() {
    let server = test_server();

    let all: ProductsResponse = server.get("/api/products").await.json();
    assert_eq!(all.products.len(), 8);

    let everything: ProductsResponse = server
        .get("/api/products")
        .add_query_param("category", "All")
        .await
        .json();
    assert_eq!(everything.products.len(), 8);

    let dresses: ProductsResponse = server
        .get("/api/products")
        .add_query_param("category", "Dresses")
        .await
        .json();
    assert_eq!(
        dresses.products.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![1, 5]
    );

    let raw: Value = server.get("/api/products").await.json();
    assert_eq!(raw["products"][0]["inStock"], true);
}

/// Single product lookup, including ids that are not numbers
#[tokio::test]
async fn test_get_product() {
    let server = test_server();

    let response = server.get("/api/products/6").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let product: ProductResponse = response.json();
    assert_eq!(product.product.name, "Leather Ankle Boots");

    for path in ["/api/products/99", "/api/products/boots"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let error: Value = response.json();
        assert_eq!(error["message"], "Product not found");
    }
}

/// Order placement, lookup and listing
#[tokio::test]
async fn test_order_lifecycle() {
    let server = test_server();

    let response = server
        .post("/api/orders")
        .json(&order_body(json!([
            { "productId": 1, "quantity": 2 },
            { "productId": 3, "quantity": 1 }
        ])))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let created: OrderResponse = response.json();
    assert_eq!(created.message.as_deref(), Some("Order created successfully"));
    assert_eq!(created.order.total, 259.97);
    assert_eq!(created.order.status, OrderStatus::Confirmed);
    assert_eq!(created.order.payment_method, PaymentMethod::CreditCard);
    assert!(created.order.transaction_id.starts_with("txn_"));
    assert_eq!(created.order.shipping_address.city, "San Francisco");

    let fetched: OrderResponse = server
        .get(&format!("/api/orders/{}", created.order.id))
        .await
        .json();
    assert_eq!(fetched.order, created.order);

    let listed: OrdersResponse = server.get("/api/orders").await.json();
    assert_eq!(listed.orders.len(), 1);

    let missing = server.get("/api/orders/999").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    let error: Value = missing.json();
    assert_eq!(error["message"], "Order not found");
}

/// Ordering more than is in stock fails with the product name
#[tokio::test]
async fn test_order_out_of_stock() {
    let server = test_server();

    let response = server
        .post("/api/orders")
        .json(&order_body(json!([{ "productId": 6, "quantity": 7 }])))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let error: Value = response.json();
    assert_eq!(error["message"], "Product Leather Ankle Boots is out of stock");

    let listed: OrdersResponse = server.get("/api/orders").await.json();
    assert!(listed.orders.is_empty());
}

/// Unknown products and empty orders are client errors
#[tokio::test]
async fn test_order_validation() {
    let server = test_server();

    let unknown = server
        .post("/api/orders")
        .json(&order_body(json!([{ "productId": 42, "quantity": 1 }])))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

    let empty = server.post("/api/orders").json(&order_body(json!([]))).await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let zero = server
        .post("/api/orders")
        .json(&order_body(json!([{ "productId": 1, "quantity": 0 }])))
        .await;
    assert_eq!(zero.status_code(), StatusCode::BAD_REQUEST);
}

/// A declined charge stores nothing
#[tokio::test]
async fn test_payment_declined() {
    let server = declining_server();

    let response = server
        .post("/api/orders")
        .json(&order_body(json!([{ "productId": 2, "quantity": 1 }])))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let error: Value = response.json();
    assert_eq!(error["success"], false);
    assert_eq!(error["message"], "Payment declined by gateway");

    let listed: OrdersResponse = server.get("/api/orders").await.json();
    assert!(listed.orders.is_empty());
}

/// Trace debug endpoint reports missing headers
#[tokio::test]
async fn test_debug_trace_without_headers() {
    let server = test_server();

    let debug: TraceDebugResponse = server.get("/api/debug/trace").await.json();
    assert_eq!(debug.message, "Trace context received");
    assert_eq!(debug.headers.traceparent, "NOT RECEIVED");
    assert_eq!(debug.headers.tracestate, "NOT RECEIVED");
    assert!(debug.note.starts_with('❌'));
}

/// Trace debug endpoint echoes the received traceparent
#[tokio::test]
async fn test_debug_trace_with_headers() {
    let server = test_server();

    let debug: TraceDebugResponse = server
        .get("/api/debug/trace")
        .add_header(
            HeaderName::from_static("traceparent"),
            HeaderValue::from_static(TRACEPARENT),
        )
        .await
        .json();
    assert_eq!(debug.headers.traceparent, TRACEPARENT);
    assert_eq!(debug.headers.tracestate, "NOT RECEIVED");
    assert!(debug.note.starts_with('✅'));

    let raw: Value = server.get("/api/debug/trace").await.json();
    assert!(raw["activeSpan"]["traceId"].is_string());
}

/// Unknown routes get a JSON 404 naming the route
#[tokio::test]
async fn test_unknown_route() {
    let server = test_server();

    let response = server.get("/api/wishlist").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let error: Value = response.json();
    assert_eq!(error["success"], false);
    assert_eq!(error["message"], "Route GET /api/wishlist not found");
}

/// Every response carries a request id, and a caller's id is kept
#[tokio::test]
async fn test_request_id_propagation() {
    let server = test_server();

    let generated = server.get("/api/products").await;
    assert!(generated.headers().contains_key("x-request-id"));

    let response = server
        .get("/api/products")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "req-42");
}

/// Preflight from the storefront origin may send trace headers
#[tokio::test]
async fn test_cors_allows_trace_headers() {
    let server = test_server();

    let response = server
        .method(axum::http::Method::OPTIONS, "/api/products")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://localhost:5173"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("GET"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-headers"),
            HeaderValue::from_static("traceparent,tracestate"),
        )
        .await;

    assert_eq!(
        response.header("access-control-allow-origin"),
        "http://localhost:5173"
    );
    let allowed = response
        .header("access-control-allow-headers")
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("traceparent"));
    assert!(allowed.contains("tracestate"));
}

/// Metrics route exists but needs an installed recorder
#[tokio::test]
async fn test_metrics_without_recorder() {
    let server = test_server();

    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
