//! Pricing Engine
//!
//! Deterministic price breakdown over a cart, an optional promo code, and an
//! explicit [`PricingConfig`]. Uses `rust_decimal` for all monetary values -
//! never use f64 for money! Internal values keep full decimal precision;
//! rounding to cents happens only at display time via [`PriceBreakdown::rounded`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;

/// Processor pass-through rate applied to small orders.
const SMALL_ORDER_FEE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 2); // 0.03
/// Flat processor pass-through applied to small orders.
const SMALL_ORDER_FEE_FLAT: Decimal = Decimal::from_parts(30, 0, 0, false, 2); // 0.30

/// How a promo code discounts the subtotal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoKind {
    /// Subtract a fixed dollar amount
    Flat,
    /// Subtract a percentage of the subtotal
    Percent,
}

/// A configured promo code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Canonical code (stored lowercased in the config map)
    pub code: String,
    pub kind: PromoKind,
    /// Dollars for `Flat`, whole percentage points for `Percent`
    pub value: Decimal,
}

/// Outcome of resolving user promo input against the config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromoResolution {
    Applied(AppliedPromo),
    /// Non-empty input that matched nothing - distinct from empty input so
    /// the UI can say "invalid code" rather than "enter a code".
    Invalid,
    /// Empty input
    Empty,
}

/// A promo accepted for this checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedPromo {
    /// The user's input, uppercased - what we display and submit
    pub display_code: String,
    pub promo: PromoCode,
}

/// Static pricing configuration, constructed once and passed by parameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Sales tax rate as a fraction (e.g. 0.0775)
    pub tax_rate: Decimal,

    /// Orders with a taxable subtotal strictly below this (in dollars) pay
    /// the small-order processor fee
    pub small_order_fee_threshold: Decimal,

    /// Promo codes keyed by lowercased code
    pub promo_codes: HashMap<String, PromoCode>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(775, 4), // 7.75%
            small_order_fee_threshold: Decimal::from(10),
            promo_codes: HashMap::new(),
        }
    }
}

impl PricingConfig {
    /// Resolve user-entered promo input. Lookup is case-insensitive; the
    /// code echoed back to the user is their input, uppercased.
    pub fn resolve_promo(&self, input: &str) -> PromoResolution {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return PromoResolution::Empty;
        }
        match self.promo_codes.get(&trimmed.to_lowercase()) {
            Some(promo) => PromoResolution::Applied(AppliedPromo {
                display_code: trimmed.to_uppercase(),
                promo: promo.clone(),
            }),
            None => PromoResolution::Invalid,
        }
    }
}

/// The full price breakdown for a cart, in decimal dollars.
///
/// Recomputed on every cart mutation and again at submission time; never
/// persisted independently of the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub taxable_subtotal: Decimal,
    pub tax: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Compute the breakdown for a cart under the given config.
    ///
    /// Invariants: `discount` is clamped to `[0, subtotal]`;
    /// `total = taxable_subtotal + tax + fee`; the fee applies iff
    /// `0 < taxable_subtotal < threshold`.
    pub fn compute(cart: &Cart, promo: Option<&PromoCode>, config: &PricingConfig) -> Self {
        let subtotal = Decimal::from(cart.total_cents()) / Decimal::ONE_HUNDRED;

        let raw_discount = match promo {
            Some(p) => match p.kind {
                PromoKind::Flat => p.value,
                PromoKind::Percent => subtotal * p.value / Decimal::ONE_HUNDRED,
            },
            None => Decimal::ZERO,
        };
        let discount = raw_discount.clamp(Decimal::ZERO, subtotal);

        let taxable_subtotal = subtotal - discount;
        let tax = taxable_subtotal * config.tax_rate;

        let fee = if taxable_subtotal > Decimal::ZERO
            && taxable_subtotal < config.small_order_fee_threshold
        {
            (taxable_subtotal + tax) * SMALL_ORDER_FEE_RATE + SMALL_ORDER_FEE_FLAT
        } else {
            Decimal::ZERO
        };

        Self {
            subtotal,
            discount,
            taxable_subtotal,
            tax,
            fee,
            total: taxable_subtotal + tax + fee,
        }
    }

    /// Display copy, rounded to cents. Only for rendering - the unrounded
    /// values are what submission carries.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: self.subtotal.round_dp(2),
            discount: self.discount.round_dp(2),
            taxable_subtotal: self.taxable_subtotal.round_dp(2),
            tax: self.tax.round_dp(2),
            fee: self.fee.round_dp(2),
            total: self.total.round_dp(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config_with_promos() -> PricingConfig {
        let mut promo_codes = HashMap::new();
        promo_codes.insert(
            "save10".to_string(),
            PromoCode {
                code: "save10".into(),
                kind: PromoKind::Percent,
                value: dec!(10),
            },
        );
        promo_codes.insert(
            "fivebucks".to_string(),
            PromoCode {
                code: "fivebucks".into(),
                kind: PromoKind::Flat,
                value: dec!(5),
            },
        );
        PricingConfig {
            tax_rate: dec!(0.0775),
            small_order_fee_threshold: dec!(10),
            promo_codes,
        }
    }

    fn cart(lines: &[(&str, u64, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (product, cents, qty) in lines {
            cart.add_item(*product, *cents, *qty, None);
        }
        cart
    }

    #[test]
    fn test_small_order_fee_worked_example() {
        // $8 subtotal, 7.75% tax, $10 threshold:
        // tax = 0.62, fee = (8 + 0.62) * 0.03 + 0.30 = 0.5586, total = 9.1786
        let cart = cart(&[("Sourdough", 800, 1)]);
        let b = PriceBreakdown::compute(&cart, None, &config_with_promos());

        assert_eq!(b.subtotal, dec!(8));
        assert_eq!(b.tax, dec!(0.62));
        assert_eq!(b.fee, dec!(0.5586));
        assert_eq!(b.total, dec!(9.1786));
        assert_eq!(b.rounded().total, dec!(9.18));
    }

    #[test]
    fn test_percent_promo_scenario() {
        // 2x Chocolate Chip at 350c with SAVE10 (10%)
        let cart = cart(&[("Chocolate Chip", 350, 2)]);
        let config = config_with_promos();
        let PromoResolution::Applied(applied) = config.resolve_promo("SAVE10") else {
            panic!("promo should resolve");
        };

        let b = PriceBreakdown::compute(&cart, Some(&applied.promo), &config);
        assert_eq!(b.subtotal, dec!(7.00));
        assert_eq!(b.discount, dec!(0.70));
        assert_eq!(b.taxable_subtotal, dec!(6.30));
        assert_eq!(b.tax, dec!(0.48825));
        // Under the $10 threshold, so the fee applies
        assert_eq!(b.fee, dec!(6.78825) * dec!(0.03) + dec!(0.30));
        assert_eq!(b.total, b.taxable_subtotal + b.tax + b.fee);
    }

    #[test]
    fn test_fee_only_below_threshold() {
        let config = config_with_promos();

        let under = PriceBreakdown::compute(&cart(&[("Rye", 999, 1)]), None, &config);
        assert!(under.fee > Decimal::ZERO);

        let at = PriceBreakdown::compute(&cart(&[("Rye", 1000, 1)]), None, &config);
        assert_eq!(at.fee, Decimal::ZERO);

        let over = PriceBreakdown::compute(&cart(&[("Rye", 1000, 3)]), None, &config);
        assert_eq!(over.fee, Decimal::ZERO);

        let empty = PriceBreakdown::compute(&Cart::new(), None, &config);
        assert_eq!(empty.fee, Decimal::ZERO);
        assert_eq!(empty.total, Decimal::ZERO);
    }

    #[test]
    fn test_flat_discount_clamped_to_subtotal() {
        let config = config_with_promos();
        let PromoResolution::Applied(applied) = config.resolve_promo("fivebucks") else {
            panic!("promo should resolve");
        };

        // $3 cart with a $5 flat promo: discount clamps, nothing goes negative
        let b = PriceBreakdown::compute(&cart(&[("Scone", 300, 1)]), Some(&applied.promo), &config);
        assert_eq!(b.discount, dec!(3.00));
        assert_eq!(b.taxable_subtotal, Decimal::ZERO);
        assert_eq!(b.tax, Decimal::ZERO);
        assert_eq!(b.fee, Decimal::ZERO);
        assert_eq!(b.total, Decimal::ZERO);
    }

    #[test]
    fn test_breakdown_is_idempotent() {
        let cart = cart(&[("Chocolate Chip", 350, 2), ("Baguette", 450, 1)]);
        let config = config_with_promos();
        let a = PriceBreakdown::compute(&cart, None, &config);
        let b = PriceBreakdown::compute(&cart, None, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_promo_resolution_signals() {
        let config = config_with_promos();

        match config.resolve_promo("  Save10 ") {
            PromoResolution::Applied(applied) => {
                assert_eq!(applied.display_code, "SAVE10");
                assert_eq!(applied.promo.kind, PromoKind::Percent);
            }
            other => panic!("expected Applied, got {other:?}"),
        }

        assert_eq!(config.resolve_promo("NOPE"), PromoResolution::Invalid);
        assert_eq!(config.resolve_promo("   "), PromoResolution::Empty);
    }
}
