//! Route handlers. Each one opens its `api.*` span under the request's server
//! span and reports progress as span events.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{field, info, Instrument, Span};

use crate::api::server::AppState;
use crate::core::error::{StoreError, StoreResult};
use crate::core::ids;
use crate::core::types::{
    CreateOrderRequest, HealthResponse, LoginRequest, LoginResponse, OrderResponse,
    OrdersResponse, ProductResponse, ProductsResponse, PublicUser, ReceivedTraceHeaders,
    TraceDebugResponse,
};
use crate::observability::tracing::{current_trace_ids, in_span, mark_ok, set_user_context};

const NOT_RECEIVED: &str = "NOT RECEIVED";

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> StoreResult<Json<LoginResponse>> {
    let Json(credentials) = payload?;

    let span = crate::store_span!(
        "api.auth.login",
        http.method = "POST",
        http.route = "/api/auth/login",
        user.email = field::Empty,
        user.id = field::Empty,
        auth.result = field::Empty
    );
    span.record("user.email", credentials.email.as_str());

    let result = in_span(span.clone(), async {
        info!("login_attempt_started");
        match state
            .store
            .validate_credentials(&credentials.email, &credentials.password)
            .await
        {
            Some(user) => {
                info!(user.id = user.id, "login_successful");
                Ok(user)
            }
            None => {
                info!("login_failed");
                Err(StoreError::InvalidCredentials)
            }
        }
    })
    .await;

    match result {
        Ok(user) => {
            span.record("auth.result", "success");
            set_user_context(&span, user.id, &user.email);
            Ok(Json(LoginResponse {
                success: true,
                user: PublicUser::from(&user),
                token: ids::session_token(user.id),
            }))
        }
        Err(e) => {
            span.record("auth.result", "failure");
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// `GET /api/products?category=`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> StoreResult<Json<ProductsResponse>> {
    let span = crate::store_span!(
        "api.products.list",
        http.method = "GET",
        http.route = "/api/products",
        filter.category = field::Empty,
        products.count = field::Empty
    );
    if let Some(category) = &query.category {
        span.record("filter.category", category.as_str());
    }

    let products = async {
        let products = state.store.list_products(query.category.as_deref()).await;
        info!(count = products.len(), "products_fetched");
        products
    }
    .instrument(span.clone())
    .await;

    span.record("products.count", products.len());
    mark_ok(&span);

    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}

/// `GET /api/products/:id`; ids that are not numbers are simply not found
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StoreResult<Json<ProductResponse>> {
    let span = crate::store_span!("api.products.get", product.id = field::Empty);

    let product = in_span(span.clone(), async {
        let id: u32 = id.parse().map_err(|_| StoreError::not_found("Product"))?;
        Span::current().record("product.id", id);

        let product = state.store.get_product(id).await;
        match &product {
            Ok(_) => info!("product_found"),
            Err(_) => info!("product_not_found"),
        }
        product
    })
    .await?;

    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> StoreResult<(StatusCode, Json<OrderResponse>)> {
    let Json(request) = payload?;

    let span = crate::store_span!(
        "api.orders.create",
        http.method = "POST",
        http.route = "/api/orders",
        order.user_id = request.user_id,
        order.item_count = request.items.len(),
        order.payment_method = request.payment_method.as_str(),
        order.id = field::Empty,
        order.total = field::Empty
    );

    let order = in_span(span.clone(), state.store.create_order(request)).await?;
    span.record("order.id", order.id);
    span.record("order.total", order.total);

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            order,
            message: Some("Order created successfully".to_string()),
        }),
    ))
}

/// `GET /api/orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StoreResult<Json<OrderResponse>> {
    let span = crate::store_span!("api.orders.get", order.id = field::Empty);

    let order = in_span(span.clone(), async {
        let id: u64 = id.parse().map_err(|_| StoreError::not_found("Order"))?;
        Span::current().record("order.id", id);

        let order = state.store.get_order(id).await;
        match &order {
            Ok(_) => info!("order_found"),
            Err(_) => info!("order_not_found"),
        }
        order
    })
    .await?;

    Ok(Json(OrderResponse {
        success: true,
        order,
        message: None,
    }))
}

/// `GET /api/orders`
pub async fn list_orders(State(state): State<AppState>) -> StoreResult<Json<OrdersResponse>> {
    let span = crate::store_span!("api.orders.list", orders.count = field::Empty);

    let orders = async {
        let orders = state.store.list_orders().await;
        info!("orders_fetched");
        orders
    }
    .instrument(span.clone())
    .await;

    span.record("orders.count", orders.len());
    mark_ok(&span);

    Ok(Json(OrdersResponse {
        success: true,
        orders,
    }))
}

/// `GET /api/debug/trace`: shows what trace context reached the server
pub async fn debug_trace(headers: HeaderMap) -> Json<TraceDebugResponse> {
    let span = crate::store_span!("api.debug.trace");

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let traceparent = header("traceparent");
    let tracestate = header("tracestate");

    let note = if traceparent.is_some() {
        "✅ Distributed tracing is working!"
    } else {
        "❌ traceparent header not received - check CORS and fetch config"
    };

    let response = TraceDebugResponse {
        success: true,
        message: "Trace context received".to_string(),
        headers: ReceivedTraceHeaders {
            traceparent: traceparent.unwrap_or_else(|| NOT_RECEIVED.to_string()),
            tracestate: tracestate.unwrap_or_else(|| NOT_RECEIVED.to_string()),
        },
        active_span: span.in_scope(current_trace_ids),
        note: note.to_string(),
    };

    span.in_scope(|| {
        info!(
            traceparent = %response.headers.traceparent,
            trace_id = %response.active_span.trace_id,
            "🔍 Debug trace endpoint called"
        )
    });
    mark_ok(&span);

    Json(response)
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StoreError::not_found("Metrics recorder").into_response(),
    }
}

/// JSON 404 for every unknown route
pub async fn not_found(method: Method, uri: Uri) -> StoreError {
    StoreError::not_found(format!("Route {} {}", method, uri.path()))
}
