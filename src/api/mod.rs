//! HTTP surface of the storefront: routes, handlers and request middleware.

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{build_router, AppState, StoreServer};
