//! Webhook Event Parsing
//!
//! Parses the (already signature-verified) webhook body into the one event
//! shape this system acts on. Everything else comes back as `Other` and is
//! acknowledged without processing.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{PaymentError, Result};

/// Parsed webhook event
#[derive(Clone, Debug)]
pub enum WebhookEvent {
    /// Checkout completed - forward the order to the sink
    CheckoutCompleted(CompletedOrder),

    /// Unhandled event type
    Other { event_type: String },
}

/// A completed order, normalized from the provider's session object.
#[derive(Clone, Debug)]
pub struct CompletedOrder {
    /// Provider session id
    pub id: String,

    /// Amount in dollars (the provider reports minor units)
    pub amount_dollars: Decimal,

    /// Provider-verified customer email
    pub customer_email: String,

    /// Flattened order metadata attached at session creation
    pub metadata: HashMap<String, String>,

    /// Provider payment status string
    pub payment_status: String,

    /// Session creation time
    pub created: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawData,
}

#[derive(Deserialize)]
struct RawData {
    object: RawSession,
}

#[derive(Deserialize)]
struct RawSession {
    id: String,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_details: Option<RawCustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    created: Option<i64>,
}

#[derive(Deserialize)]
struct RawCustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

/// Parse a verified webhook body.
pub fn parse_event(body: &[u8]) -> Result<WebhookEvent> {
    let raw: RawEvent =
        serde_json::from_slice(body).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

    if raw.event_type != "checkout.session.completed" {
        return Ok(WebhookEvent::Other {
            event_type: raw.event_type,
        });
    }

    let session = raw.data.object;
    let amount_dollars =
        Decimal::from(session.amount_total.unwrap_or(0)) / Decimal::from(100);
    let customer_email = session
        .customer_details
        .and_then(|d| d.email)
        .or(session.customer_email)
        .unwrap_or_default();
    let created = session
        .created
        .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
        .unwrap_or_else(Utc::now);

    Ok(WebhookEvent::CheckoutCompleted(CompletedOrder {
        id: session.id,
        amount_dollars,
        customer_email,
        metadata: session.metadata.unwrap_or_default(),
        payment_status: session.payment_status.unwrap_or_default(),
        created,
    }))
}
