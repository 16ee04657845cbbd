//! Checkout Form State and Validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bakehouse_core::{Cart, CheckoutRules, FulfillmentType};
use bakehouse_slots::SlotSelector;

/// Customer contact fields. All required.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Delivery address fields. All required when fulfillment is delivery.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Mutable form state owned by the orchestrator.
#[derive(Clone, Debug)]
pub struct CheckoutForm {
    pub customer: CustomerInfo,
    pub fulfillment: FulfillmentType,
    pub address: Option<DeliveryAddress>,
}

impl CheckoutForm {
    pub fn new(fulfillment: FulfillmentType) -> Self {
        Self {
            customer: CustomerInfo::default(),
            fulfillment,
            address: None,
        }
    }
}

/// A field-level validation failure. Recovered locally, surfaced as a
/// message next to the field; never fatal and never sent over the network.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Orders are limited to {max} items")]
    QuantityCap { max: u32 },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Enter a valid email address")]
    InvalidEmail,

    /// ZIP outside the delivery area. Rendered as a dedicated
    /// "delivery unavailable, switch to pickup" prompt, not a plain field
    /// error.
    #[error("Delivery is not available for {zip} - switch to pickup to continue")]
    DeliveryUnavailable { zip: String },

    #[error("Choose a fulfillment window")]
    NoSlotSelected,
}

/// Run the full pre-submission gate, in order: cart, quantity cap, customer
/// fields, delivery address + ZIP allow-list, slot selection.
pub fn validate(
    form: &CheckoutForm,
    cart: &Cart,
    selector: &SlotSelector,
    rules: &CheckoutRules,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if cart.is_empty() {
        issues.push(ValidationIssue::EmptyCart);
    }
    if cart.total_quantity() > rules.max_order_quantity {
        issues.push(ValidationIssue::QuantityCap {
            max: rules.max_order_quantity,
        });
    }

    let customer = &form.customer;
    for (name, value) in [
        ("first name", &customer.first_name),
        ("last name", &customer.last_name),
        ("email", &customer.email),
        ("phone", &customer.phone),
    ] {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::MissingField(name));
        }
    }
    if !customer.email.trim().is_empty() && !email_is_valid(&customer.email) {
        issues.push(ValidationIssue::InvalidEmail);
    }

    if form.fulfillment == FulfillmentType::Delivery {
        match &form.address {
            None => issues.push(ValidationIssue::MissingField("address")),
            Some(address) => {
                for (name, value) in [
                    ("street", &address.street),
                    ("city", &address.city),
                    ("state", &address.state),
                    ("zip", &address.zip),
                ] {
                    if value.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField(name));
                    }
                }
                if !address.zip.trim().is_empty() && !rules.zip_deliverable(&address.zip) {
                    issues.push(ValidationIssue::DeliveryUnavailable {
                        zip: address.zip.trim().to_string(),
                    });
                }
            }
        }
    }

    if !selector.validate() {
        issues.push(ValidationIssue::NoSlotSelected);
    }

    issues
}

/// Lightweight email shape check: one `@`, non-empty local part, and a dot
/// somewhere in the domain.
pub fn email_is_valid(email: &str) -> bool {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.len() >= 3
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
