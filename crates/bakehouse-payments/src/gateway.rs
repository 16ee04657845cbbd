//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: the intake handler
//! creates a one-off payment session from the cart's price references and
//! redirects the customer to the hosted payment page.

use std::collections::HashMap;

use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
};

use crate::error::{PaymentError, Result};

/// Stripe client wrapper
pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    /// Create a new gateway
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        Ok(Self::new(&secret_key, &webhook_secret))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Create a hosted checkout session for an order.
    ///
    /// Every line must already carry a provider price reference; fulfillment
    /// and customer details ride along as string-only metadata so the
    /// completed-order webhook can forward them to the sink.
    pub async fn create_order_session(
        &self,
        request: OrderSessionRequest,
    ) -> Result<HostedSession> {
        let line_items: Vec<CreateCheckoutSessionLineItems> = request
            .line_items
            .iter()
            .map(|line| CreateCheckoutSessionLineItems {
                price: Some(line.price_ref.clone()),
                quantity: Some(u64::from(line.quantity)),
                ..Default::default()
            })
            .collect();

        let mut params = CreateCheckoutSession::new();
        params.customer_email = Some(&request.customer_email);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);
        params.metadata = Some(request.metadata.clone());
        params.line_items = Some(line_items);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        tracing::info!(session_id = %session.id, "Created checkout session");

        Ok(HostedSession {
            id: session.id.to_string(),
            url,
        })
    }
}

/// Request to create an order session
#[derive(Clone, Debug)]
pub struct OrderSessionRequest {
    /// Cart lines as provider price references
    pub line_items: Vec<SessionLineItem>,

    /// Customer email, prefilled on the hosted page
    pub customer_email: String,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    /// Flattened order metadata (string keys and values only)
    pub metadata: HashMap<String, String>,
}

/// One line of a session request
#[derive(Clone, Debug)]
pub struct SessionLineItem {
    pub price_ref: String,
    pub quantity: u32,
}

/// Result of creating a session
#[derive(Clone, Debug)]
pub struct HostedSession {
    /// Provider session id
    pub id: String,

    /// Hosted payment page URL to redirect the customer to
    pub url: String,
}
