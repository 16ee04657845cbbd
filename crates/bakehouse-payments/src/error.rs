//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    SignatureInvalid(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// A cart line has no provider price reference
    #[error("Missing price reference for {0}")]
    MissingPriceRef(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// How an upstream provider failure maps onto the intake response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamErrorClass {
    /// Provider rejected the line items (bad/stale price refs) -> 400
    InvalidCart,
    /// Provider reported an inventory problem -> 409
    SoldOut,
    /// Anything else -> 500
    Upstream,
}

/// Classify a provider error message. The provider does not give structured
/// reasons for these cases, so this matches on message text the same way the
/// reference handler did.
pub fn classify_provider_error(message: &str) -> UpstreamErrorClass {
    let lower = message.to_lowercase();
    if lower.contains("inventory") {
        UpstreamErrorClass::SoldOut
    } else if lower.contains("line_items") || lower.contains("no such price") {
        UpstreamErrorClass::InvalidCart
    } else {
        UpstreamErrorClass::Upstream
    }
}

impl PaymentError {
    /// Classify for the intake response status.
    pub fn classify(&self) -> UpstreamErrorClass {
        match self {
            Self::Stripe(msg) => classify_provider_error(msg),
            Self::MissingPriceRef(_) => UpstreamErrorClass::InvalidCart,
            _ => UpstreamErrorClass::Upstream,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self.classify() {
            UpstreamErrorClass::InvalidCart => "Your cart could not be processed. Please refresh and try again.",
            UpstreamErrorClass::SoldOut => "One or more items just sold out.",
            UpstreamErrorClass::Upstream => "Payment processing failed. Please try again.",
        }
    }
}
