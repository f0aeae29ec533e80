//! # Storefront
//!
//! The shopper side of ChicCloset: what the web shop does in the browser,
//! written as a library the `storefront` binary drives. It talks to the API
//! through [`StorefrontClient`], and every step of the journey (login, cart,
//! checkout, payment) is traced so one trace covers both processes.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod client;
pub mod demo;
pub mod pricing;
pub mod session;
pub mod validators;

pub use cart::{Cart, CartItem};
pub use catalog::SortOption;
pub use checkout::{
    Checkout, CheckoutError, CheckoutForm, FormErrors, OrderConfirmation, PaymentForm,
};
pub use client::StorefrontClient;
pub use demo::{DemoScenario, ExperimentGroup};
pub use pricing::OrderTotals;
pub use session::Session;
