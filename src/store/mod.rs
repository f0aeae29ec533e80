//! # Store
//!
//! The mock backend: catalog, users and orders held in memory, a simulated
//! database that turns every lookup into a traced, delayed query, and a payment
//! gateway. Operations live in the submodules as `impl Store` blocks.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::core::config::SimulationConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{Order, Product, User};

pub mod auth;
pub mod catalog;
pub mod database;
pub mod inventory;
pub mod orders;
pub mod payment;

pub use database::Database;
pub use inventory::InventoryCheck;
pub use payment::{PaymentGateway, PaymentOutcome, SimulatedGateway};

const PRODUCTS_QUERY_LATENCY: Duration = Duration::from_millis(20);
const PRODUCT_QUERY_LATENCY: Duration = Duration::from_millis(25);

/// In-memory shop state shared by every request
pub struct Store {
    products: Vec<Product>,
    users: Vec<User>,
    orders: RwLock<Vec<Order>>,
    database: Database,
    payments: Arc<dyn PaymentGateway>,
}

impl Store {
    /// Seeded store charging through the simulated gateway
    pub fn new(simulation: SimulationConfig) -> Self {
        let gateway = Arc::new(SimulatedGateway::from_config(&simulation));
        Self::with_gateway(simulation, gateway)
    }

    /// Seeded store charging through `gateway`
    pub fn with_gateway(simulation: SimulationConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            products: catalog::seed_products(),
            users: catalog::seed_users(),
            orders: RwLock::new(Vec::new()),
            database: Database::new(simulation),
            payments: gateway,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub(crate) fn orders(&self) -> &RwLock<Vec<Order>> {
        &self.orders
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn payment_gateway(&self) -> &dyn PaymentGateway {
        self.payments.as_ref()
    }

    /// Products in `category`; `None` or `"All"` returns the whole catalog
    pub async fn list_products(&self, category: Option<&str>) -> Vec<Product> {
        self.database.query("query.products", PRODUCTS_QUERY_LATENCY).await;

        self.products
            .iter()
            .filter(|product| catalog::matches_category(product, category))
            .cloned()
            .collect()
    }

    pub async fn get_product(&self, id: u32) -> StoreResult<Product> {
        self.database.query("query.product_by_id", PRODUCT_QUERY_LATENCY).await;

        self.products
            .iter()
            .find(|product| product.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Product"))
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("products", &self.products.len())
            .field("users", &self.users.len())
            .field("orders", &self.orders.read().len())
            .field("payment_gateway", &self.payments.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_products_by_category() {
        let store = Store::new(SimulationConfig::instant());
        assert_eq!(store.list_products(None).await.len(), 8);
        assert_eq!(store.list_products(Some("All")).await.len(), 8);

        let tops = store.list_products(Some("Tops")).await;
        assert_eq!(
            tops.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Silk Blouse - Ivory", "Cashmere Sweater"]
        );
        assert!(store.list_products(Some("Hats")).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_product() {
        let store = Store::new(SimulationConfig::instant());
        assert_eq!(store.get_product(2).await.unwrap().name, "Classic Denim Jacket");
        assert!(matches!(
            store.get_product(9).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
