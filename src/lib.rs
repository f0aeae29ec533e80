//! # ChicCloset - Core Library Crate
//!
//! A fashion storefront built to teach distributed tracing. The crate holds both
//! halves of the shop:
//!
//! - the **API server** (`api` + `store`): catalog, login and orders served by
//!   axum over a simulated database and payment gateway;
//! - the **storefront client** (`storefront`): the shopper's session, cart and
//!   checkout, calling the API with `reqwest`.
//!
//! Both run under the same OpenTelemetry setup (`observability`). The client
//! injects W3C `traceparent` headers on every call and the server continues the
//! trace, so a single checkout shows up as one trace spanning both processes.
//!
//! ## Module Layout
//!
//! Modules form a tree starting from this file. `pub use` re-exports below make
//! the common entry points available from the crate root, so callers can write
//! `use chiccloset::StoreServer` instead of the full path.

/// Error type, configuration, shared data structures and id generators
pub mod core;

/// Logging, distributed tracing and business metrics
pub mod observability;

/// The mock backend: seeded catalog and users, simulated database, inventory,
/// payments and orders
pub mod store;

/// HTTP server: routes, handlers and the request tracing middleware
pub mod api;

/// Shopper-side client: session, cart, checkout and demo scenarios
pub mod storefront;

/// Main error type and result alias
pub use core::error::{StoreError, StoreResult};

/// Top-level configuration
pub use core::config::{SimulationConfig, StoreConfig};

/// Server entry points
pub use api::server::{build_router, AppState, StoreServer};

/// Backend state shared by every request
pub use store::Store;

/// Telemetry bootstrap, used by both binaries
pub use observability::{init_telemetry, TelemetryGuard};

/// Client entry points
pub use storefront::{Cart, Checkout, Session, StorefrontClient};
