//! Stock checks for order lines.

use std::time::Duration;

use tracing::{field, info, Instrument};

use crate::core::types::Product;
use crate::observability::tracing::{mark_error, mark_ok};
use crate::store::Store;

const INVENTORY_LATENCY: Duration = Duration::from_millis(40);

/// Result of one stock check
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryCheck {
    pub available: bool,
    /// The product, when the id exists at all
    pub product: Option<Product>,
}

impl InventoryCheck {
    /// Name used in the out-of-stock message: product name, or the raw id
    pub fn display_name(&self, product_id: u32) -> String {
        self.product
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| product_id.to_string())
    }
}

impl Store {
    /// Available iff the product exists and has at least `quantity` in stock
    pub async fn check_inventory(&self, product_id: u32, quantity: u32) -> InventoryCheck {
        let span = crate::store_span!(
            "inventory.check",
            product.id = product_id,
            quantity.requested = quantity,
            inventory.available = field::Empty,
            inventory.stock = field::Empty
        );

        let check = async {
            self.database().query("query.inventory", INVENTORY_LATENCY).await;

            let product = self.products().iter().find(|p| p.id == product_id).cloned();
            let stock = product.as_ref().map_or(0, |p| p.stock);
            let available = product.is_some() && stock >= quantity;

            if available {
                info!(available_stock = stock, requested_quantity = quantity, "inventory_sufficient");
            } else {
                info!(available_stock = stock, requested_quantity = quantity, "inventory_insufficient");
            }

            InventoryCheck { available, product }
        }
        .instrument(span.clone())
        .await;

        span.record("inventory.available", check.available);
        if check.available {
            if let Some(product) = &check.product {
                span.record("inventory.stock", product.stock);
            }
            mark_ok(&span);
        } else {
            mark_error(&span, "Insufficient stock");
        }

        check
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::SimulationConfig;
    use crate::store::Store;

    #[tokio::test]
    async fn test_stock_boundaries() {
        let store = Store::new(SimulationConfig::instant());

        // Leather Ankle Boots has 6 in stock
        assert!(store.check_inventory(6, 6).await.available);
        let short = store.check_inventory(6, 7).await;
        assert!(!short.available);
        assert_eq!(short.display_name(6), "Leather Ankle Boots");
    }

    #[tokio::test]
    async fn test_unknown_product_is_unavailable() {
        let store = Store::new(SimulationConfig::instant());
        let check = store.check_inventory(99, 1).await;
        assert!(!check.available);
        assert!(check.product.is_none());
        assert_eq!(check.display_name(99), "99");
    }
}
