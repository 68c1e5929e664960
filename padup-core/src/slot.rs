use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot timestamp errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSlotError {
    #[error("empty slot timestamp")]
    Empty,

    #[error("unparseable slot timestamp: {0}")]
    Unparseable(String),

    #[error("slot interval is empty or negative: {starts_at} -> {ends_at}")]
    EmptyInterval {
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
}

/// Canonical identity of a bookable slot.
///
/// Two representations of the same instant always map to the same key,
/// regardless of the offset they were written in: identity is the instant
/// rendered in UTC at second precision (e.g. `2024-06-01T08:00:00Z`).
/// Used both as the lock key and as the stable rendering key for slot lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotId(String);

// Deserialization re-normalizes, so a key read back from storage or a client
// payload can never bypass `parse`.
impl<'de> Deserialize<'de> for SlotId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SlotId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl SlotId {
    /// Derive the canonical key from any timezone-aware start time.
    pub fn from_datetime<Tz: TimeZone>(starts_at: &DateTime<Tz>) -> SlotId {
        let utc = starts_at.with_timezone(&Utc).trunc_subsecs(0);
        SlotId(utc.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Parse an RFC 3339 rendering (any offset) into the canonical key.
    pub fn parse(input: &str) -> Result<SlotId, InvalidSlotError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InvalidSlotError::Empty);
        }
        let parsed = DateTime::parse_from_rfc3339(trimmed)
            .map_err(|_| InvalidSlotError::Unparseable(trimmed.to_string()))?;
        Ok(SlotId::from_datetime(&parsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instant this key denotes.
    pub fn starts_at(&self) -> DateTime<Utc> {
        // The canonical form is RFC 3339 by construction.
        DateTime::parse_from_rfc3339(&self.0)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| unreachable!("canonical slot key is always RFC 3339"))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed-duration bookable interval on a court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<Slot, InvalidSlotError> {
        if ends_at <= starts_at {
            return Err(InvalidSlotError::EmptyInterval { starts_at, ends_at });
        }
        Ok(Slot {
            starts_at: starts_at.trunc_subsecs(0),
            ends_at: ends_at.trunc_subsecs(0),
        })
    }

    pub fn id(&self) -> SlotId {
        SlotId::from_datetime(&self.starts_at)
    }

    pub fn duration(&self) -> Duration {
        self.ends_at - self.starts_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_same_instant_same_key() {
        // 10:00 at +02:00 and 08:00 UTC are the same instant
        let a = SlotId::parse("2024-06-01T10:00:00+02:00").unwrap();
        let b = SlotId::parse("2024-06-01T08:00:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "2024-06-01T08:00:00Z");
    }

    #[test]
    fn test_datetime_and_string_agree() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let from_dt = SlotId::from_datetime(&dt);
        let from_str = SlotId::parse("2024-06-01T10:00:00+02:00").unwrap();
        assert_eq!(from_dt, from_str);
    }

    #[test]
    fn test_different_instants_differ() {
        let a = SlotId::parse("2024-06-01T08:00:00Z").unwrap();
        let b = SlotId::parse("2024-06-01T09:30:00Z").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(SlotId::parse(""), Err(InvalidSlotError::Empty));
        assert_eq!(SlotId::parse("   "), Err(InvalidSlotError::Empty));
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let err = SlotId::parse("saturday at ten").unwrap_err();
        assert!(matches!(err, InvalidSlotError::Unparseable(_)));
    }

    #[test]
    fn test_roundtrip_starts_at() {
        let id = SlotId::parse("2024-06-01T10:00:00+02:00").unwrap();
        assert_eq!(SlotId::from_datetime(&id.starts_at()), id);
    }

    #[test]
    fn test_slot_interval_validation() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();

        let slot = Slot::new(start, end).unwrap();
        assert_eq!(slot.duration(), Duration::minutes(90));
        assert_eq!(slot.id().as_str(), "2024-06-01T08:00:00Z");

        assert!(Slot::new(end, start).is_err());
        assert!(Slot::new(start, start).is_err());
    }
}
