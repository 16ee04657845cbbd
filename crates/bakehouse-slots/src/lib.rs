//! # bakehouse-slots
//!
//! Fulfillment "drop window" handling: pulls the remote calendar feed,
//! extracts bounded time windows as structured slots, and manages the
//! customer's slot selection against the advisory capacity ledger.

pub mod error;
pub mod feed;
pub mod selector;

pub use error::{Result, SlotError};
pub use feed::{fetch_slots, parse_feed, FulfillmentSlot, SlotType};
pub use selector::{SlotSelector, SlotSelectorConfig};
