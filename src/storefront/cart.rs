//! # Shopping Cart
//!
//! The shopper's cart. Every mutating operation runs in its own `cart.*` span,
//! records what changed as span fields and events, feeds the cart business
//! metrics and writes one structured log line. Reads (`total`, `count`) are
//! called all the time and stay untraced.

use serde::{Deserialize, Serialize};
use tracing::{field, info};

use crate::core::types::{OrderItem, Product};
use crate::observability::metrics::BusinessMetrics;
use crate::observability::tracing::{mark_ok, record_business_metric};
use crate::storefront::pricing;

/// A product and how many of it are in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: u32) -> Option<usize> {
        self.items.iter().position(|item| item.product.id == product_id)
    }

    /// Add one unit of `product`; returns the new quantity of that line
    pub fn add_item(&mut self, product: &Product) -> u32 {
        let span = crate::store_span!(
            "cart.addItem",
            product.id = product.id,
            product.name = %product.name,
            product.price = product.price,
            product.category = %product.category,
            cart.action = field::Empty,
            cart.previousQuantity = field::Empty,
            cart.newQuantity = field::Empty
        );
        let _guard = span.enter();

        let (action, event_type, quantity) = match self.position(product.id) {
            Some(index) => {
                let item = &mut self.items[index];
                span.record("cart.previousQuantity", item.quantity);
                item.quantity += 1;
                ("increment", "quantity_increased", item.quantity)
            }
            None => {
                self.items.push(CartItem {
                    product: product.clone(),
                    quantity: 1,
                });
                ("add_new", "new_item", 1)
            }
        };
        span.record("cart.action", action);
        span.record("cart.newQuantity", quantity);

        info!("event.type" = event_type, product.name = %product.name, "item_added_to_cart");

        BusinessMetrics::cart_addition(product.id, &product.category, 1);
        BusinessMetrics::revenue_potential(product.price);
        record_business_metric("user.add_to_cart", 1.0, "count");

        info!(
            product.id = product.id,
            product.price = product.price,
            cart.action = action,
            "🛒 Item added to cart: {}",
            product.name
        );
        mark_ok(&span);
        quantity
    }

    /// Drop a line from the cart; removing an absent product changes nothing
    pub fn remove_item(&mut self, product_id: u32) -> Option<CartItem> {
        let span = crate::store_span!(
            "cart.removeItem",
            product.id = product_id,
            product.name = field::Empty,
            cart.removedQuantity = field::Empty,
            cart.valueRemoved = field::Empty
        );
        let _guard = span.enter();

        let removed = self.position(product_id).map(|index| self.items.remove(index));
        if let Some(item) = &removed {
            span.record("product.name", item.product.name.as_str());
            span.record("cart.removedQuantity", item.quantity);
            span.record("cart.valueRemoved", item.line_total());
        }

        info!(product.id = product_id, "item_removed_from_cart");

        let quantity = removed.as_ref().map_or(0, |item| item.quantity);
        BusinessMetrics::cart_removal(product_id, quantity);

        info!(product.id = product_id, quantity.removed = quantity, "Item removed from cart");
        mark_ok(&span);
        removed
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Returns the previous quantity, `None` when the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: u32, quantity: u32) -> Option<u32> {
        let span = crate::store_span!(
            "cart.updateQuantity",
            product.id = product_id,
            product.name = field::Empty,
            cart.newQuantity = quantity,
            cart.previousQuantity = field::Empty,
            cart.quantityDelta = field::Empty
        );

        if quantity == 0 {
            span.in_scope(|| info!("quantity_zero_removing_item"));
            mark_ok(&span);
            drop(span);
            return self.remove_item(product_id).map(|item| item.quantity);
        }

        let _guard = span.enter();
        let Some(index) = self.position(product_id) else {
            info!(product.id = product_id, "quantity_update_skipped");
            mark_ok(&span);
            return None;
        };

        let item = &mut self.items[index];
        let previous = item.quantity;
        item.quantity = quantity;
        let delta = i64::from(quantity) - i64::from(previous);

        span.record("product.name", item.product.name.as_str());
        span.record("cart.previousQuantity", previous);
        span.record("cart.quantityDelta", delta);

        info!(product.id = product_id, new.quantity = quantity, "quantity_updated");

        match delta {
            d if d > 0 => BusinessMetrics::cart_addition(product_id, &item.product.category, d as u32),
            d if d < 0 => BusinessMetrics::cart_removal(product_id, d.unsigned_abs() as u32),
            _ => {}
        }

        info!(
            product.id = product_id,
            new.quantity = quantity,
            previous.quantity = previous,
            "Cart quantity updated"
        );
        mark_ok(&span);
        Some(previous)
    }

    /// Empty the cart; a non-empty cart counts as abandoned
    pub fn clear(&mut self) {
        let item_count = self.items.len();
        let total_quantity = self.count();
        let total_value = self.total();

        let span = crate::store_span!(
            "cart.clear",
            cart.itemCount = item_count,
            cart.totalQuantity = total_quantity,
            cart.totalValue = total_value
        );
        let _guard = span.enter();

        self.items.clear();
        info!(items.removed = item_count, total.value = total_value, "cart_cleared");

        if item_count > 0 {
            BusinessMetrics::cart_abandonment(item_count as u32, total_value);
        }

        info!(items.removed = item_count, total.value = total_value, "Cart cleared");
        mark_ok(&span);
    }

    /// Sum of price × quantity
    pub fn total(&self) -> f64 {
        pricing::subtotal(self.items.iter().map(|item| (item.product.price, item.quantity)))
    }

    /// Number of units across all lines
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Order lines for `POST /api/orders`
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }
}
