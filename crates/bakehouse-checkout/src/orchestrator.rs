//! Checkout Orchestrator
//!
//! Coordinates the cart, the slot selector, and the form through the
//! submission protocol. All pricing is recomputed from current state at the
//! moment it is needed - the breakdown shown in the UI and the one in the
//! submitted payload are the same pure function of the same inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bakehouse_core::{
    AppliedPromo, Cart, CheckoutRules, FulfillmentType, PriceBreakdown, PricingConfig,
    PromoResolution,
};
use bakehouse_slots::{SlotError, SlotSelector};

use crate::form::{validate, CheckoutForm, CustomerInfo, DeliveryAddress, ValidationIssue};

/// Where the checkout UI is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutPhase {
    Empty,
    Filling,
    Submitting,
    Success,
    Error,
}

/// Checkout configuration, constructed once and passed in.
#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    /// Order-intake endpoint (`POST /session`)
    pub intake_url: String,

    pub pricing: PricingConfig,
    pub rules: CheckoutRules,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Order rejected: {message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },
}

/// One submitted order line (wire names per the intake endpoint).
#[derive(Clone, Debug, Serialize)]
pub struct OrderLine {
    pub product: String,
    #[serde(rename = "price_id", skip_serializing_if = "Option::is_none")]
    pub price_ref: Option<String>,
    pub qty: u32,
    /// Unit price in dollars
    pub unit_price: Decimal,
}

/// Fulfillment details as submitted.
#[derive(Clone, Debug, Serialize)]
pub struct FulfillmentDetails {
    #[serde(rename = "type")]
    pub fulfillment_type: FulfillmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<DeliveryAddress>,
}

/// The selected slot, flattened for submission and the success summary.
#[derive(Clone, Debug, Serialize)]
pub struct SlotSummary {
    pub id: String,
    pub start: DateTime<Utc>,
    pub title: String,
}

/// The order as submitted. Constructed fresh per submission from cart +
/// form state; never stored, only transmitted (and echoed as the success
/// summary).
#[derive(Clone, Debug, Serialize)]
pub struct OrderPayload {
    pub customer: CustomerInfo,
    pub fulfillment: FulfillmentDetails,
    pub order: Vec<OrderLine>,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub discount: Decimal,
    pub tax: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Intake endpoint response body.
#[derive(Debug, Default, Deserialize)]
struct IntakeResponse {
    url: Option<String>,
    success: Option<bool>,
    error: Option<String>,
    message: Option<String>,
}

/// Owns all checkout state and drives the phase machine.
pub struct CheckoutOrchestrator {
    http: reqwest::Client,
    config: CheckoutConfig,
    cart: Cart,
    selector: SlotSelector,
    form: CheckoutForm,
    promo: Option<AppliedPromo>,
    phase: CheckoutPhase,
    issues: Vec<ValidationIssue>,
    last_order: Option<OrderPayload>,
}

impl CheckoutOrchestrator {
    pub fn new(config: CheckoutConfig, cart: Cart, selector: SlotSelector) -> Self {
        let fulfillment = selector.fulfillment_type();
        let phase = if cart.is_empty() {
            CheckoutPhase::Empty
        } else {
            CheckoutPhase::Filling
        };
        Self {
            http: reqwest::Client::new(),
            config,
            cart,
            selector,
            form: CheckoutForm::new(fulfillment),
            promo: None,
            phase,
            issues: Vec::new(),
            last_order: None,
        }
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn selector(&self) -> &SlotSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut SlotSelector {
        &mut self.selector
    }

    /// Validation issues from the last `validate` call.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// The submitted order, available in the `Success` phase. The success
    /// summary renders from this, not from any server response body.
    pub fn order_summary(&self) -> Option<&OrderPayload> {
        self.last_order.as_ref()
    }

    /// Current price breakdown, recomputed from scratch every call.
    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown::compute(
            &self.cart,
            self.promo.as_ref().map(|p| &p.promo),
            &self.config.pricing,
        )
    }

    // ----- commands (the UI's event handlers call these) -----

    pub fn add_to_cart(
        &mut self,
        product: impl Into<String>,
        unit_price_cents: u64,
        quantity: u32,
        price_ref: Option<String>,
    ) {
        self.cart.add_item(product, unit_price_cents, quantity, price_ref);
        self.on_cart_mutated();
    }

    pub fn set_quantity(&mut self, product: &str, quantity: u32) {
        self.cart.set_quantity(product, quantity);
        self.on_cart_mutated();
    }

    pub fn increment(&mut self, product: &str) {
        self.cart.increment(product);
        self.on_cart_mutated();
    }

    pub fn decrement(&mut self, product: &str) {
        self.cart.decrement(product);
        self.on_cart_mutated();
    }

    /// Apply (or clear) a promo code. An unknown code clears any previously
    /// applied promo - a bad entry must not silently keep an old discount.
    pub fn apply_promo(&mut self, input: &str) -> PromoResolution {
        let resolution = self.config.pricing.resolve_promo(input);
        self.promo = match &resolution {
            PromoResolution::Applied(applied) => Some(applied.clone()),
            PromoResolution::Invalid | PromoResolution::Empty => None,
        };
        resolution
    }

    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.form.customer = customer;
    }

    pub fn set_address(&mut self, address: Option<DeliveryAddress>) {
        self.form.address = address;
    }

    pub fn on_fulfillment_type_changed(&mut self, fulfillment: FulfillmentType) {
        self.form.fulfillment = fulfillment;
        self.selector.set_fulfillment_type(fulfillment);
    }

    pub fn on_slot_selected(&mut self, slot_id: &str) -> Result<(), SlotError> {
        self.selector.select(slot_id)
    }

    /// Run the pre-submission gate and stash field-level issues for the UI.
    pub fn validate(&mut self) -> bool {
        self.issues = validate(&self.form, &self.cart, &self.selector, &self.config.rules);
        self.issues.is_empty()
    }

    /// Submit the order. On success the cart is cleared, capacity is
    /// recorded, and the redirect URL (if any) is returned. On failure all
    /// state is kept so the customer can retry.
    pub async fn submit(&mut self) -> Result<Option<String>, CheckoutError> {
        if !self.validate() {
            return Err(CheckoutError::Validation(self.issues.clone()));
        }

        self.phase = CheckoutPhase::Submitting;
        let payload = self.build_payload();

        let result = self
            .http
            .post(&self.config.intake_url)
            .json(&payload)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Order submission failed");
                self.phase = CheckoutPhase::Error;
                return Err(e.into());
            }
        };

        let status = response.status();
        let body: IntakeResponse = response.json().await.unwrap_or_default();

        if !status.is_success() || body.success == Some(false) {
            self.phase = CheckoutPhase::Error;
            return Err(CheckoutError::Rejected {
                code: body.error,
                message: body
                    .message
                    .unwrap_or_else(|| format!("Order submission failed ({status})")),
            });
        }

        // Confirmed: record capacity against the slot's local date, then
        // clear the cart.
        let quantity = self.cart.total_quantity();
        if let Some(date) = self.selector.selected_slot().map(|s| s.local_date()) {
            self.selector.record_order(date, quantity);
        }
        self.cart.clear();
        self.phase = CheckoutPhase::Success;
        self.last_order = Some(payload);

        tracing::info!(quantity, "Order submitted");
        Ok(body.url)
    }

    /// Return to `Filling` after a failed submission, without revalidating.
    /// Cart and form state are unchanged.
    pub fn retry(&mut self) {
        if self.phase == CheckoutPhase::Error {
            self.phase = CheckoutPhase::Filling;
        }
    }

    /// Assemble the order payload from current state, recomputing the full
    /// breakdown rather than reusing anything previously rendered.
    pub fn build_payload(&self) -> OrderPayload {
        let breakdown = self.breakdown();

        OrderPayload {
            customer: self.form.customer.clone(),
            fulfillment: FulfillmentDetails {
                fulfillment_type: self.form.fulfillment,
                slot: self.selector.selected_slot().map(|s| SlotSummary {
                    id: s.id.clone(),
                    start: s.start,
                    title: s.title.clone(),
                }),
                address: self.form.address.clone(),
            },
            order: self
                .cart
                .items
                .iter()
                .map(|l| OrderLine {
                    product: l.product.clone(),
                    price_ref: l.price_ref.clone(),
                    qty: l.quantity,
                    unit_price: Decimal::from(l.unit_price_cents) / Decimal::from(100),
                })
                .collect(),
            subtotal: breakdown.subtotal,
            promo_code: self.promo.as_ref().map(|p| p.display_code.clone()),
            discount: breakdown.discount,
            tax: breakdown.tax,
            fee: breakdown.fee,
            total: breakdown.total,
            submitted_at: Utc::now(),
        }
    }

    fn on_cart_mutated(&mut self) {
        if self.cart.is_empty() {
            if self.phase == CheckoutPhase::Filling {
                self.phase = CheckoutPhase::Empty;
            }
        } else if self.phase == CheckoutPhase::Empty {
            self.phase = CheckoutPhase::Filling;
        }
    }
}
