//! # Storefront API Client
//!
//! `reqwest` client for the storefront API. Every call runs in a client span
//! named `HTTP {method} {path}` and carries the span's W3C trace context in its
//! headers, so the server's spans join the shopper's trace.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, field, Span};
use url::Url;

use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{
    CreateOrderRequest, ErrorResponse, HealthResponse, LoginRequest, LoginResponse, Order,
    OrderResponse, OrdersResponse, Product, ProductResponse, ProductsResponse,
    TraceDebugResponse,
};
use crate::observability::tracing::{in_span, inject_current_context, record_business_metric};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StorefrontClient {
    pub fn new(base_url: &str) -> StoreResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| StoreError::config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        // keep any path prefix when joining relative routes
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> StoreResult<HealthResponse> {
        self.send(Method::GET, "/health", |request| request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> StoreResult<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/api/auth/login", &body).await
    }

    /// Products, optionally narrowed to one category
    pub async fn products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let response: ProductsResponse = self
            .send(Method::GET, "/api/products", |request| match category {
                Some(category) => request.query(&[("category", category)]),
                None => request,
            })
            .await?;
        Ok(response.products)
    }

    /// One product; counts as a product page view
    pub async fn product(&self, id: u32) -> StoreResult<Product> {
        let path = format!("/api/products/{}", id);
        match self.send::<ProductResponse, _>(Method::GET, &path, |request| request).await {
            Ok(response) => {
                record_business_metric("page.product_view", 1.0, "count");
                Ok(response.product)
            }
            Err(e) => {
                if matches!(e, StoreError::Api { status: 404, .. }) {
                    record_business_metric("page.product_not_found", 1.0, "count");
                }
                Err(e)
            }
        }
    }

    pub async fn create_order(&self, order: &CreateOrderRequest) -> StoreResult<Order> {
        let response: OrderResponse = self.send_json(Method::POST, "/api/orders", order).await?;
        Ok(response.order)
    }

    pub async fn order(&self, id: u64) -> StoreResult<Order> {
        let path = format!("/api/orders/{}", id);
        let response: OrderResponse = self.send(Method::GET, &path, |request| request).await?;
        Ok(response.order)
    }

    pub async fn orders(&self) -> StoreResult<Vec<Order>> {
        let response: OrdersResponse = self.send(Method::GET, "/api/orders", |request| request).await?;
        Ok(response.orders)
    }

    /// Ask the server which trace context it received
    pub async fn debug_trace(&self) -> StoreResult<TraceDebugResponse> {
        self.send(Method::GET, "/api/debug/trace", |request| request).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> StoreResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(method, path, |request| request.json(body)).await
    }

    async fn send<T, F>(&self, method: Method, path: &str, customize: F) -> StoreResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| StoreError::config(format!("Invalid API path '{}': {}", path, e)))?;

        let span = crate::store_span!(
            "http.client",
            otel.name = %format!("HTTP {} {}", method, path),
            otel.kind = "client",
            http.method = %method,
            http.url = %url,
            http.status_code = field::Empty
        );

        let request = customize(self.http.request(method, url));
        in_span(span.clone(), async move {
            let mut request = request;
            for (name, value) in inject_current_context() {
                request = request.header(name, value);
            }

            let response = request.send().await?;
            let status = response.status();
            Span::current().record("http.status_code", status.as_u16());
            debug!(status = status.as_u16(), "response received");

            if !status.is_success() {
                let fallback = status.canonical_reason().unwrap_or("Request failed").to_string();
                let message = response
                    .json::<ErrorResponse>()
                    .await
                    .map(|body| body.message)
                    .unwrap_or(fallback);
                return Err(StoreError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            Ok(response.json::<T>().await?)
        })
        .await
    }
}
