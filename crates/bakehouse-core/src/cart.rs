//! Shopping Cart
//!
//! The cart is an explicit state object owned by the caller; every mutation
//! goes through a named method and bumps the last-modified timestamp. There
//! is no hidden singleton and no implicit persistence - callers serialize
//! the cart to whatever local storage they have.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped when the persisted cart shape changes; loaders drop carts with an
/// unknown version instead of guessing.
pub const CART_SCHEMA_VERSION: u32 = 2;

/// A single cart line.
///
/// At most one line exists per product name; adding the same product again
/// merges into the existing line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name, unique within the cart
    pub product: String,

    /// Unit price in cents
    pub unit_price_cents: u64,

    /// Quantity, always >= 1 (a quantity of 0 deletes the line)
    pub quantity: u32,

    /// Payment-provider price reference, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_ref: Option<String>,
}

/// An ordered list of cart lines plus bookkeeping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,

    pub schema_version: u32,

    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            schema_version: CART_SCHEMA_VERSION,
            updated_at: Utc::now(),
        }
    }

    /// Accept a cart restored from client-local storage. A cart with any
    /// other schema version is dropped and replaced with a fresh empty one.
    pub fn from_persisted(cart: Self) -> Self {
        if cart.schema_version == CART_SCHEMA_VERSION {
            cart
        } else {
            Self::new()
        }
    }

    /// Add a product to the cart, merging into an existing line if the
    /// product is already present (quantities sum, a missing price ref is
    /// backfilled).
    pub fn add_item(
        &mut self,
        product: impl Into<String>,
        unit_price_cents: u64,
        quantity: u32,
        price_ref: Option<String>,
    ) {
        if quantity == 0 {
            return;
        }
        let product = product.into();

        if let Some(line) = self.items.iter_mut().find(|l| l.product == product) {
            line.quantity += quantity;
            if line.price_ref.is_none() {
                line.price_ref = price_ref;
            }
        } else {
            self.items.push(CartItem {
                product,
                unit_price_cents,
                quantity,
                price_ref,
            });
        }
        self.touch();
    }

    /// Overwrite a line's quantity; 0 (or anything that would go below 1)
    /// removes the line. Unknown products are ignored.
    pub fn set_quantity(&mut self, product: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|l| l.product == product) {
            line.quantity = quantity;
            self.touch();
        }
    }

    pub fn increment(&mut self, product: &str) {
        if let Some(line) = self.items.iter_mut().find(|l| l.product == product) {
            line.quantity += 1;
            self.touch();
        }
    }

    /// Decrement a line by one; hitting 0 removes the line.
    pub fn decrement(&mut self, product: &str) {
        let Some(line) = self.items.iter_mut().find(|l| l.product == product) else {
            return;
        };
        if line.quantity <= 1 {
            self.remove_item(product);
        } else {
            line.quantity -= 1;
            self.touch();
        }
    }

    pub fn remove_item(&mut self, product: &str) {
        let before = self.items.len();
        self.items.retain(|l| l.product != product);
        if self.items.len() != before {
            self.touch();
        }
    }

    /// Sum of unit price x quantity over all lines, in cents.
    pub fn total_cents(&self) -> u64 {
        self.items
            .iter()
            .map(|l| l.unit_price_cents * u64::from(l.quantity))
            .sum()
    }

    /// Total unit quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empty the cart (called after a confirmed order submission).
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add_item("Chocolate Chip", 350, 1, None);
        cart.add_item("Chocolate Chip", 350, 2, Some("price_abc".into()));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        // Price ref backfilled by the second add
        assert_eq!(cart.items[0].price_ref.as_deref(), Some("price_abc"));
    }

    #[test]
    fn test_add_then_remove_round_trips() {
        let mut cart = Cart::new();
        cart.add_item("Sourdough", 900, 1, None);
        cart.add_item("Baguette", 450, 1, None);

        cart.remove_item("Baguette");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product, "Sourdough");

        cart.remove_item("Sourdough");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_removes() {
        let mut cart = Cart::new();
        cart.add_item("Rye", 800, 2, None);
        cart.set_quantity("Rye", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item("Rye", 800, 1, None);
        cart.decrement("Rye");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add_item("Chocolate Chip", 350, 2, None);
        cart.add_item("Baguette", 450, 1, None);

        assert_eq!(cart.total_cents(), 1150);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_stale_schema_version_drops_persisted_cart() {
        let mut stale = Cart::new();
        stale.add_item("Rye", 800, 1, None);
        stale.schema_version = 1;

        let restored = Cart::from_persisted(stale);
        assert!(restored.is_empty());
        assert_eq!(restored.schema_version, CART_SCHEMA_VERSION);

        let mut current = Cart::new();
        current.add_item("Rye", 800, 1, None);
        assert_eq!(Cart::from_persisted(current.clone()).items, current.items);
    }

    #[test]
    fn test_unknown_product_is_ignored() {
        let mut cart = Cart::new();
        cart.add_item("Rye", 800, 1, None);
        cart.set_quantity("Brioche", 5);
        cart.increment("Brioche");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_quantity(), 1);
    }
}
