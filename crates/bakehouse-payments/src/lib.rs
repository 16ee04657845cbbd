//! # bakehouse-payments
//!
//! Payment-provider integration for the bakehouse storefront, using the
//! "Stripe Checkout (Hosted)" approach: the order-intake handler creates a
//! session from the cart's price references and redirects the customer to
//! Stripe's hosted payment page. Payment completion comes back as a signed
//! webhook event, verified here against the raw request body.
//!
//! Nothing in this crate is durable. The session exists at the provider, the
//! completed order is forwarded onward by the caller, and the provider's own
//! retry policy is the sole reliability mechanism at the webhook boundary.

mod error;
mod event;
mod gateway;
mod signature;

pub use error::{PaymentError, Result, UpstreamErrorClass};
pub use event::{parse_event, CompletedOrder, WebhookEvent};
pub use gateway::{HostedSession, OrderSessionRequest, SessionLineItem, StripeGateway};
pub use signature::verify_signature;
