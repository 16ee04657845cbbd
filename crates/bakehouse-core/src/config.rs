//! Checkout Rules
//!
//! Explicit configuration passed by parameter into validation - no global
//! mutable CONFIG object.

use serde::{Deserialize, Serialize};

/// Storefront checkout constraints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRules {
    /// Maximum total unit quantity per order
    pub max_order_quantity: u32,

    /// ZIP codes eligible for delivery (5-digit strings)
    pub delivery_zips: Vec<String>,

    /// Per-day unit limit used by the advisory capacity ledger
    pub per_day_unit_limit: u32,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        Self {
            max_order_quantity: 24,
            delivery_zips: Vec::new(),
            per_day_unit_limit: 12,
        }
    }
}

impl CheckoutRules {
    /// Whether a ZIP is in the delivery allow-list.
    ///
    /// Matches on the exact 5-digit prefix; an optional `+4` suffix
    /// ("92118-2301") is ignored.
    pub fn zip_deliverable(&self, zip: &str) -> bool {
        let Some(prefix) = zip.trim().split('-').next() else {
            return false;
        };
        prefix.len() == 5
            && prefix.chars().all(|c| c.is_ascii_digit())
            && self.delivery_zips.iter().any(|z| z == prefix)
    }
}
