//! Calendar Feed Parsing
//!
//! Scans the line-oriented calendar text for `BEGIN:VEVENT` blocks and turns
//! events whose summary carries the configured title prefix into
//! [`FulfillmentSlot`]s. Malformed lines are skipped, not reported - the feed
//! is hand-maintained and a single bad event should not take the storefront
//! down.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use bakehouse_core::FulfillmentType;

use crate::error::Result;

/// Events without a DTEND get this window length.
const DEFAULT_SLOT_HOURS: i64 = 2;

/// What a slot can fulfill, classified from the event summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Pickup,
    Delivery,
    Both,
}

impl SlotType {
    /// Whether this slot can serve the given fulfillment type.
    pub fn accepts(self, fulfillment: FulfillmentType) -> bool {
        match self {
            Self::Both => true,
            Self::Pickup => fulfillment == FulfillmentType::Pickup,
            Self::Delivery => fulfillment == FulfillmentType::Delivery,
        }
    }
}

/// A bounded fulfillment window extracted from the calendar feed.
///
/// Immutable once fetched; grouped by viewer-local date for display and
/// capacity tracking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FulfillmentSlot {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub title: String,
    pub description: String,
}

impl FulfillmentSlot {
    /// The slot's calendar date in the viewer's local timezone. Display and
    /// the capacity ledger both key on this, not on the feed's own date
    /// strings.
    pub fn local_date(&self) -> NaiveDate {
        self.start.with_timezone(&Local).date_naive()
    }
}

/// Fetch the feed and parse upcoming slots. No in-process caching - the
/// caller applies HTTP-level cache headers.
pub async fn fetch_slots(
    client: &reqwest::Client,
    feed_url: &str,
    title_prefix: &str,
) -> Result<Vec<FulfillmentSlot>> {
    let text = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let slots = parse_feed(&text, title_prefix, Utc::now());
    tracing::debug!(count = slots.len(), "Parsed slots from calendar feed");
    Ok(slots)
}

/// Parse calendar text into slots: prefix-filtered, future-only, sorted
/// ascending by start.
pub fn parse_feed(text: &str, title_prefix: &str, now: DateTime<Utc>) -> Vec<FulfillmentSlot> {
    let mut slots = Vec::new();
    let mut event: Option<RawEvent> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if line == "BEGIN:VEVENT" {
            event = Some(RawEvent::default());
            continue;
        }
        if line == "END:VEVENT" {
            if let Some(raw) = event.take() {
                if let Some(slot) = raw.into_slot(title_prefix) {
                    slots.push(slot);
                }
            }
            continue;
        }

        let Some(raw) = event.as_mut() else { continue };
        if let Some(v) = property_value(line, "SUMMARY") {
            raw.summary = Some(v.to_string());
        } else if let Some(v) = property_value(line, "DTSTART") {
            raw.dtstart = Some(v.to_string());
        } else if let Some(v) = property_value(line, "DTEND") {
            raw.dtend = Some(v.to_string());
        } else if let Some(v) = property_value(line, "DESCRIPTION") {
            raw.description = Some(v.to_string());
        } else if let Some(v) = property_value(line, "UID") {
            raw.uid = Some(v.to_string());
        }
    }

    slots.retain(|s| s.start > now);
    slots.sort_by_key(|s| s.start);
    slots
}

#[derive(Default)]
struct RawEvent {
    summary: Option<String>,
    dtstart: Option<String>,
    dtend: Option<String>,
    description: Option<String>,
    uid: Option<String>,
}

impl RawEvent {
    fn into_slot(self, title_prefix: &str) -> Option<FulfillmentSlot> {
        let summary = self.summary?;
        if !summary.starts_with(title_prefix) {
            return None;
        }

        let start = parse_ics_timestamp(self.dtstart.as_deref()?)?;
        let end = self
            .dtend
            .as_deref()
            .and_then(parse_ics_timestamp)
            .unwrap_or_else(|| start + Duration::hours(DEFAULT_SLOT_HOURS));

        Some(FulfillmentSlot {
            id: self
                .uid
                .unwrap_or_else(|| start.timestamp().to_string()),
            start,
            end,
            slot_type: classify(&summary),
            title: summary,
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Extract a property value by name prefix, ignoring `;`-delimited parameters
/// such as timezone IDs (`DTSTART;TZID=...:20241221T100000`).
fn property_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if !(rest.starts_with(':') || rest.starts_with(';')) {
        return None;
    }
    line.split_once(':').map(|(_, value)| value)
}

/// Parse an ICS timestamp value.
///
/// 8-digit values are all-day dates at local midnight. Values containing `T`
/// are date-times: a trailing `Z` means UTC, its absence is read as local
/// time. No timezone database is consulted for TZID parameters - a known
/// precision limitation carried over deliberately.
fn parse_ics_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        let midnight = NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?;
        return Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }

    if raw.contains('T') {
        let (body, is_utc) = match raw.strip_suffix('Z') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let naive = NaiveDateTime::parse_from_str(body, "%Y%m%dT%H%M%S").ok()?;
        return if is_utc {
            Some(Utc.from_utc_datetime(&naive))
        } else {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        };
    }

    None
}

/// Classify the window from summary keywords.
fn classify(summary: &str) -> SlotType {
    let lower = summary.to_lowercase();
    match (lower.contains("pickup"), lower.contains("delivery")) {
        (true, false) => SlotType::Pickup,
        (false, true) => SlotType::Delivery,
        _ => SlotType::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed "now" well before every test event.
    fn early_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn feed(events: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{events}END:VCALENDAR\r\n")
    }

    #[test]
    fn test_all_day_event_is_local_midnight_both() {
        let text = feed(
            "BEGIN:VEVENT\r\nUID:drop-1\r\nSUMMARY:Bread Drop\r\nDTSTART:20241221\r\nEND:VEVENT\r\n",
        );
        let slots = parse_feed(&text, "Bread Drop", early_now());
        assert_eq!(slots.len(), 1);

        let expected = Local
            .with_ymd_and_hms(2024, 12, 21, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(slots[0].start, expected);
        // No pickup/delivery keyword in the summary
        assert_eq!(slots[0].slot_type, SlotType::Both);
        // Missing DTEND defaults to start + 2h
        assert_eq!(slots[0].end, expected + Duration::hours(2));
        assert_eq!(slots[0].id, "drop-1");
    }

    #[test]
    fn test_utc_datetime_and_classification() {
        let text = feed(
            "BEGIN:VEVENT\r\nSUMMARY:Bread Drop - Pickup\r\nDTSTART:20241221T180000Z\r\nDTEND:20241221T200000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Bread Drop - Delivery Window\r\nDTSTART:20241222T180000Z\r\nEND:VEVENT\r\n",
        );
        let slots = parse_feed(&text, "Bread Drop", early_now());
        assert_eq!(slots.len(), 2);

        assert_eq!(slots[0].slot_type, SlotType::Pickup);
        assert_eq!(
            slots[0].start,
            Utc.with_ymd_and_hms(2024, 12, 21, 18, 0, 0).unwrap()
        );
        assert_eq!(slots[1].slot_type, SlotType::Delivery);
        // Fallback id is the start epoch
        assert_eq!(slots[1].id, slots[1].start.timestamp().to_string());
    }

    #[test]
    fn test_tzid_parameter_is_ignored() {
        let text = feed(
            "BEGIN:VEVENT\r\nSUMMARY:Bread Drop\r\nDTSTART;TZID=America/Los_Angeles:20241221T100000\r\nEND:VEVENT\r\n",
        );
        let slots = parse_feed(&text, "Bread Drop", early_now());
        assert_eq!(slots.len(), 1);

        // Read as naive local time, not converted through a tz database
        let expected = Local
            .with_ymd_and_hms(2024, 12, 21, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(slots[0].start, expected);
    }

    #[test]
    fn test_past_events_excluded_and_sorted() {
        let text = feed(
            "BEGIN:VEVENT\r\nSUMMARY:Bread Drop B\r\nDTSTART:20241228T180000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Bread Drop A\r\nDTSTART:20241221T180000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Bread Drop Old\r\nDTSTART:20190601T180000Z\r\nEND:VEVENT\r\n",
        );
        let slots = parse_feed(&text, "Bread Drop", early_now());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].title, "Bread Drop A");
        assert_eq!(slots[1].title, "Bread Drop B");
    }

    #[test]
    fn test_prefix_filter_is_case_sensitive() {
        let text = feed(
            "BEGIN:VEVENT\r\nSUMMARY:bread drop\r\nDTSTART:20241221T180000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Staff Meeting\r\nDTSTART:20241221T190000Z\r\nEND:VEVENT\r\n",
        );
        assert!(parse_feed(&text, "Bread Drop", early_now()).is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = feed(
            "BEGIN:VEVENT\r\nSUMMARY:Bread Drop\r\nDTSTART:not-a-date\r\nEND:VEVENT\r\n\
             garbage line\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Bread Drop\r\nDTSTART:20241221T180000Z\r\nEND:VEVENT\r\n",
        );
        let slots = parse_feed(&text, "Bread Drop", early_now());
        assert_eq!(slots.len(), 1);
    }
}
