//! # bakehouse-checkout
//!
//! The storefront's checkout flow as an explicit state machine:
//! `Empty -> Filling -> Submitting -> {Success, Error}`, with `Error ->
//! Filling` on retry. The orchestrator owns the cart, the slot selector, and
//! the form, validates them in order, recomputes the price breakdown at
//! submission time (never trusting a previously rendered value), and POSTs
//! the order payload to the intake endpoint.
//!
//! Every failure path leaves the cart and form untouched so the customer can
//! correct input and resubmit without data loss.

pub mod form;
pub mod orchestrator;

pub use form::{CheckoutForm, CustomerInfo, DeliveryAddress, ValidationIssue};
pub use orchestrator::{
    CheckoutConfig, CheckoutError, CheckoutOrchestrator, CheckoutPhase, FulfillmentDetails,
    OrderLine, OrderPayload, SlotSummary,
};
