//! Order placement and lookup.

use std::time::Duration;

use tracing::{info, warn};

use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{CreateOrderRequest, Order, OrderStatus};
use crate::observability::metrics::BusinessMetrics;
use crate::store::payment::process_payment;
use crate::store::Store;

const USER_QUERY_LATENCY: Duration = Duration::from_millis(30);
const ORDER_INSERT_LATENCY: Duration = Duration::from_millis(50);
const ORDER_QUERY_LATENCY: Duration = Duration::from_millis(25);
const ORDERS_QUERY_LATENCY: Duration = Duration::from_millis(30);

/// Round to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn validate_request(request: &CreateOrderRequest) -> StoreResult<()> {
    if request.items.is_empty() {
        return Err(StoreError::validation("items", "Order must contain at least one item"));
    }
    if let Some(item) = request.items.iter().find(|item| item.quantity == 0) {
        return Err(StoreError::validation(
            "items",
            format!("Quantity for product {} must be at least 1", item.product_id),
        ));
    }
    Ok(())
}

impl Store {
    /// Validate, check stock, charge and record an order.
    ///
    /// Progress is reported as events on the caller's span. The first failing
    /// step ends the flow; nothing is stored unless payment went through.
    pub async fn create_order(&self, request: CreateOrderRequest) -> StoreResult<Order> {
        validate_request(&request)?;
        info!(
            order.user_id = request.user_id,
            order.item_count = request.items.len(),
            "order_creation_started"
        );

        self.database().query("query.user", USER_QUERY_LATENCY).await;
        info!("user_validated");

        let mut total = 0.0;
        for item in &request.items {
            let check = self.check_inventory(item.product_id, item.quantity).await;
            match (&check.product, check.available) {
                (Some(product), true) => total += product.price * f64::from(item.quantity),
                _ => {
                    warn!(product.id = item.product_id, "inventory_check_failed");
                    return Err(StoreError::OutOfStock {
                        product: check.display_name(item.product_id),
                    });
                }
            }
        }
        let total = round_cents(total);
        info!(order.total = total, "inventory_validated");

        let transaction_id = match process_payment(
            self.payment_gateway(),
            total,
            request.payment_method,
        )
        .await
        {
            Ok(transaction_id) => transaction_id,
            Err(e) => {
                warn!(reason = %e, "payment_failed");
                return Err(e);
            }
        };
        info!(transaction_id = %transaction_id, "payment_completed");

        self.database().query("insert.order", ORDER_INSERT_LATENCY).await;

        let order = {
            let mut orders = self.orders().write();
            let order = Order {
                id: orders.len() as u64 + 1,
                user_id: request.user_id,
                items: request.items,
                total,
                shipping_address: request.shipping_address,
                payment_method: request.payment_method,
                transaction_id,
                status: OrderStatus::Confirmed,
                created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            };
            orders.push(order.clone());
            order
        };

        info!(
            order.id = order.id,
            order.total = order.total,
            order.status = order.status.as_str(),
            "order_created"
        );
        BusinessMetrics::order_created(order.payment_method.as_str(), order.total);

        Ok(order)
    }

    pub async fn get_order(&self, id: u64) -> StoreResult<Order> {
        self.database().query("query.order", ORDER_QUERY_LATENCY).await;

        self.orders()
            .read()
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Order"))
    }

    pub async fn list_orders(&self) -> Vec<Order> {
        self.database().query("query.orders", ORDERS_QUERY_LATENCY).await;
        self.orders().read().clone()
    }
}
