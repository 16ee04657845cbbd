//! # bakehouse-core
//!
//! Cart, pricing, and shared storefront logic for the bakehouse storefront.
//!
//! This crate is deliberately I/O-free: everything here is a pure function
//! over explicit state, so the same math runs identically in the checkout
//! client and in the order-intake handler. The price breakdown displayed to
//! the customer and the one submitted with the order are the *same
//! computation* on the same inputs, not a cached copy.

pub mod capacity;
pub mod cart;
pub mod config;
pub mod error;
pub mod order;
pub mod pricing;
pub mod token;

pub use capacity::CapacityLedger;
pub use cart::{Cart, CartItem, CART_SCHEMA_VERSION};
pub use config::CheckoutRules;
pub use error::{Result, StoreError};
pub use order::FulfillmentType;
pub use pricing::{
    AppliedPromo, PriceBreakdown, PricingConfig, PromoCode, PromoKind, PromoResolution,
};
pub use token::UnsubscribeTokens;
