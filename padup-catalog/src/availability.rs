use crate::club::OpeningHours;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use padup_core::slot::{Slot, SlotId};
use serde::Serialize;
use std::collections::HashSet;

/// What the availability grid shows for one slot.
///
/// `Booked` comes from confirmed bookings (the truth); `Held` comes from
/// advisory lock records and only means "someone is looking at this one
/// right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub slot_key: SlotId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SlotStatus,
}

/// Day grid of bookable slots for one court
pub struct SlotGrid;

impl SlotGrid {
    /// All slots of `date` between the club's open and close times,
    /// stepping `slot_minutes`. A trailing partial slot is dropped.
    pub fn generate(hours: &OpeningHours, date: NaiveDate, slot_minutes: u32) -> Vec<Slot> {
        let Some(day) = hours.for_weekday(date.weekday()) else {
            return Vec::new();
        };
        let step = Duration::minutes(slot_minutes as i64);

        let opens = date.and_time(day.opens_at).and_utc();
        let closes = date.and_time(day.closes_at).and_utc();

        let mut slots = Vec::new();
        let mut cursor = opens;
        while cursor + step <= closes {
            // Bounds checked above, the interval is never empty
            if let Ok(slot) = Slot::new(cursor, cursor + step) {
                slots.push(slot);
            }
            cursor += step;
        }
        slots
    }

    /// Overlay booking truth and advisory holds onto a grid. A slot both
    /// booked and held reads as booked.
    pub fn mark(
        slots: Vec<Slot>,
        booked: &HashSet<SlotId>,
        held: &HashSet<SlotId>,
    ) -> Vec<SlotView> {
        slots
            .into_iter()
            .map(|slot| {
                let slot_key = slot.id();
                let status = if booked.contains(&slot_key) {
                    SlotStatus::Booked
                } else if held.contains(&slot_key) {
                    SlotStatus::Held
                } else {
                    SlotStatus::Available
                };
                SlotView {
                    starts_at: slot.starts_at,
                    ends_at: slot.ends_at,
                    slot_key,
                    status,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hours_9_to_18() -> OpeningHours {
        OpeningHours::all_week(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_grid_covers_open_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let slots = SlotGrid::generate(&hours_9_to_18(), date, 90);

        // 9h open time / 1.5h slots = 6 slots
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].id().as_str(), "2024-06-01T09:00:00Z");
        assert_eq!(slots[5].id().as_str(), "2024-06-01T16:30:00Z");
    }

    #[test]
    fn test_trailing_partial_slot_is_dropped() {
        let hours = OpeningHours::all_week(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
        );
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        // 1h45 of open time fits only one 90-minute slot
        let slots = SlotGrid::generate(&hours, date, 90);
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_closed_day_has_no_slots() {
        let mut hours = hours_9_to_18();
        hours.saturday = None;

        // 2024-06-01 is a Saturday
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(SlotGrid::generate(&hours, date, 90).is_empty());
    }

    #[test]
    fn test_mark_precedence() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let slots = SlotGrid::generate(&hours_9_to_18(), date, 90);

        let first = slots[0].id();
        let second = slots[1].id();

        let booked: HashSet<_> = [first.clone(), second.clone()].into_iter().collect();
        let held: HashSet<_> = [second.clone(), slots[2].id()].into_iter().collect();

        let views = SlotGrid::mark(slots, &booked, &held);
        assert_eq!(views[0].status, SlotStatus::Booked);
        // Booked wins over held
        assert_eq!(views[1].status, SlotStatus::Booked);
        assert_eq!(views[2].status, SlotStatus::Held);
        assert_eq!(views[3].status, SlotStatus::Available);
    }
}
