//! Order Capacity Ledger
//!
//! Advisory, client-local tracking of how many units have been committed to
//! each fulfillment date. Nothing server-side enforces this: two buyers on
//! different devices can both book past capacity. It exists so the storefront
//! can gray out dates the *current* device has already filled.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cumulative committed unit quantity per local calendar date.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapacityLedger {
    committed: BTreeMap<NaiveDate, u32>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed order's unit quantity against a date. Only called
    /// after a successful submission.
    pub fn record(&mut self, date: NaiveDate, quantity: u32) {
        *self.committed.entry(date).or_insert(0) += quantity;
    }

    /// Units committed to a date so far.
    pub fn committed(&self, date: NaiveDate) -> u32 {
        self.committed.get(&date).copied().unwrap_or(0)
    }

    /// Whether a date has reached the per-day unit limit.
    pub fn is_sold_out(&self, date: NaiveDate, per_day_limit: u32) -> bool {
        per_day_limit > 0 && self.committed(date) >= per_day_limit
    }
}
