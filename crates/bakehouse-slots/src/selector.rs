//! Fulfillment Slot Selector
//!
//! Explicit selection state owned by the checkout flow: which slots exist,
//! which one the customer picked, and which dates the advisory capacity
//! ledger has already filled. When no feed endpoint is configured the whole
//! feature is inert and validation always passes - slot selection is layered
//! on top of checkout, not a hard dependency.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use bakehouse_core::{CapacityLedger, FulfillmentType};

use crate::error::{Result, SlotError};
use crate::feed::FulfillmentSlot;

/// Slot selector configuration.
#[derive(Clone, Debug)]
pub struct SlotSelectorConfig {
    /// Calendar feed endpoint; `None` disables the feature entirely
    pub feed_url: Option<String>,

    /// Only events whose summary starts with this are slots
    pub title_prefix: String,

    /// Per-day unit limit for the sold-out marking
    pub per_day_unit_limit: u32,
}

impl Default for SlotSelectorConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            title_prefix: "Bread Drop".into(),
            per_day_unit_limit: 12,
        }
    }
}

/// Selection state over the fetched slots.
#[derive(Clone, Debug)]
pub struct SlotSelector {
    active: bool,
    per_day_unit_limit: u32,
    slots: Vec<FulfillmentSlot>,
    fulfillment: FulfillmentType,
    selected: Option<String>,
    ledger: CapacityLedger,
}

impl SlotSelector {
    pub fn new(
        config: &SlotSelectorConfig,
        initial: FulfillmentType,
        ledger: CapacityLedger,
    ) -> Self {
        Self {
            active: config.feed_url.is_some(),
            per_day_unit_limit: config.per_day_unit_limit,
            slots: Vec::new(),
            fulfillment: initial,
            selected: None,
            ledger,
        }
    }

    /// Whether slot selection participates in checkout at all.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Replace the slot list with a fresh fetch. Keeps the current selection
    /// if the selected slot still exists.
    pub fn load_slots(&mut self, slots: Vec<FulfillmentSlot>) {
        self.slots = slots;
        if let Some(id) = &self.selected {
            if !self.slots.iter().any(|s| &s.id == id) {
                self.selected = None;
            }
        }
    }

    /// Switch fulfillment type; clears the current selection since the
    /// visible slot set changes.
    pub fn set_fulfillment_type(&mut self, fulfillment: FulfillmentType) {
        if self.fulfillment != fulfillment {
            self.fulfillment = fulfillment;
            self.selected = None;
        }
    }

    pub fn fulfillment_type(&self) -> FulfillmentType {
        self.fulfillment
    }

    /// Slots matching the current fulfillment type ("both" matches either).
    pub fn visible_slots(&self) -> impl Iterator<Item = &FulfillmentSlot> {
        self.slots
            .iter()
            .filter(|s| s.slot_type.accepts(self.fulfillment))
    }

    /// Visible slots grouped by viewer-local calendar date, for display.
    pub fn grouped_by_date(&self) -> BTreeMap<NaiveDate, Vec<&FulfillmentSlot>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<&FulfillmentSlot>> = BTreeMap::new();
        for slot in self.visible_slots() {
            grouped.entry(slot.local_date()).or_default().push(slot);
        }
        grouped
    }

    /// Whether a date's slots are rendered disabled.
    pub fn is_sold_out(&self, date: NaiveDate) -> bool {
        self.ledger.is_sold_out(date, self.per_day_unit_limit)
    }

    /// Select a slot by id. Sold-out dates and slots hidden by the current
    /// fulfillment type cannot be selected.
    pub fn select(&mut self, slot_id: &str) -> Result<()> {
        let slot = self
            .slots
            .iter()
            .filter(|s| s.slot_type.accepts(self.fulfillment))
            .find(|s| s.id == slot_id)
            .ok_or_else(|| SlotError::UnknownSlot(slot_id.to_string()))?;

        if self.is_sold_out(slot.local_date()) {
            return Err(SlotError::SlotUnavailable(slot_id.to_string()));
        }

        self.selected = Some(slot.id.clone());
        Ok(())
    }

    pub fn selected_slot(&self) -> Option<&FulfillmentSlot> {
        let id = self.selected.as_ref()?;
        self.slots.iter().find(|s| &s.id == id)
    }

    /// Field-level validation: fails only when the feature is active and no
    /// slot is selected.
    pub fn validate(&self) -> bool {
        !self.active || self.selected.is_some()
    }

    /// Record a confirmed order against a date. Only called after a
    /// successful submission; best-effort local bookkeeping with no
    /// cross-device authority.
    pub fn record_order(&mut self, date: NaiveDate, quantity: u32) {
        self.ledger.record(date, quantity);
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SlotType;
    use chrono::{Duration, TimeZone, Utc};

    fn slot(id: &str, day_offset: i64, slot_type: SlotType) -> FulfillmentSlot {
        let start = Utc.with_ymd_and_hms(2024, 12, 21, 18, 0, 0).unwrap()
            + Duration::days(day_offset);
        FulfillmentSlot {
            id: id.into(),
            start,
            end: start + Duration::hours(2),
            slot_type,
            title: format!("Bread Drop {id}"),
            description: String::new(),
        }
    }

    fn active_config() -> SlotSelectorConfig {
        SlotSelectorConfig {
            feed_url: Some("https://calendar.example.com/feed.ics".into()),
            per_day_unit_limit: 12,
            ..Default::default()
        }
    }

    #[test]
    fn test_inert_without_feed_url() {
        let selector = SlotSelector::new(
            &SlotSelectorConfig::default(),
            FulfillmentType::Pickup,
            CapacityLedger::new(),
        );
        assert!(!selector.is_active());
        assert!(selector.validate());
    }

    #[test]
    fn test_active_requires_selection() {
        let mut selector = SlotSelector::new(
            &active_config(),
            FulfillmentType::Pickup,
            CapacityLedger::new(),
        );
        selector.load_slots(vec![slot("a", 0, SlotType::Both)]);

        assert!(!selector.validate());
        selector.select("a").unwrap();
        assert!(selector.validate());
        assert_eq!(selector.selected_slot().unwrap().id, "a");
    }

    #[test]
    fn test_type_switch_clears_selection_and_hides_slots() {
        let mut selector = SlotSelector::new(
            &active_config(),
            FulfillmentType::Pickup,
            CapacityLedger::new(),
        );
        selector.load_slots(vec![
            slot("p", 0, SlotType::Pickup),
            slot("d", 1, SlotType::Delivery),
            slot("b", 2, SlotType::Both),
        ]);

        let visible: Vec<_> = selector.visible_slots().map(|s| s.id.clone()).collect();
        assert_eq!(visible, vec!["p", "b"]);

        selector.select("p").unwrap();
        selector.set_fulfillment_type(FulfillmentType::Delivery);
        assert!(selector.selected_slot().is_none());

        // The pickup-only slot is no longer selectable
        assert!(matches!(
            selector.select("p"),
            Err(SlotError::UnknownSlot(_))
        ));
        selector.select("b").unwrap();
    }

    #[test]
    fn test_sold_out_date_blocks_selection() {
        let mut ledger = CapacityLedger::new();
        let full = slot("a", 0, SlotType::Both);
        ledger.record(full.local_date(), 12);

        let mut selector = SlotSelector::new(&active_config(), FulfillmentType::Pickup, ledger);
        selector.load_slots(vec![full.clone(), slot("b", 1, SlotType::Both)]);

        assert!(selector.is_sold_out(full.local_date()));
        assert!(matches!(
            selector.select("a"),
            Err(SlotError::SlotUnavailable(_))
        ));
        selector.select("b").unwrap();
    }

    #[test]
    fn test_record_order_fills_a_date() {
        let mut selector = SlotSelector::new(
            &active_config(),
            FulfillmentType::Pickup,
            CapacityLedger::new(),
        );
        let s = slot("a", 0, SlotType::Both);
        let date = s.local_date();
        selector.load_slots(vec![s]);

        selector.record_order(date, 12);
        assert!(selector.is_sold_out(date));
    }

    #[test]
    fn test_grouping_by_local_date() {
        let mut selector = SlotSelector::new(
            &active_config(),
            FulfillmentType::Pickup,
            CapacityLedger::new(),
        );
        selector.load_slots(vec![
            slot("a", 0, SlotType::Both),
            slot("b", 0, SlotType::Both),
            slot("c", 1, SlotType::Both),
        ]);

        let grouped = selector.grouped_by_date();
        assert_eq!(grouped.len(), 2);
        let sizes: Vec<_> = grouped.values().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1]);
    }
}
