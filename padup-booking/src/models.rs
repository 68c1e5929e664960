use chrono::{DateTime, Utc};
use padup_core::slot::Slot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "PENDING"),
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::UnknownStatus(other.to_string())),
        }
    }
}

/// The single source of truth for a player's reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub court_id: Uuid,
    pub player_id: String,
    /// Canonical slot key, also the uniqueness key per court.
    pub slot_key: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub price_cents: i32,
    pub contact_email: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(court_id: Uuid, player_id: String, slot: &Slot, price_cents: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            court_id,
            player_id,
            slot_key: slot.id().as_str().to_string(),
            starts_at: slot.starts_at,
            ends_at: slot.ends_at,
            price_cents,
            contact_email: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition: Pending -> Confirmed
    pub fn confirm(&mut self) -> Result<(), BookingError> {
        if self.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: self.status.to_string(),
                to: "CONFIRMED".to_string(),
            });
        }
        self.update_status(BookingStatus::Confirmed);
        Ok(())
    }

    /// Transition: Pending | Confirmed -> Cancelled
    pub fn cancel(&mut self) -> Result<(), BookingError> {
        if self.status == BookingStatus::Cancelled {
            return Err(BookingError::InvalidTransition {
                from: self.status.to_string(),
                to: "CANCELLED".to_string(),
            });
        }
        self.update_status(BookingStatus::Cancelled);
        Ok(())
    }

    fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Cancellation window has passed (starts at {starts_at})")]
    CancellationWindowPassed { starts_at: DateTime<Utc> },

    #[error("Booking belongs to another player")]
    NotYours,

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn booking() -> Booking {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let slot = Slot::new(start, start + Duration::minutes(90)).unwrap();
        Booking::new(Uuid::new_v4(), "player-1".to_string(), &slot, 3600)
    }

    #[test]
    fn test_booking_lifecycle() {
        let mut b = booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.slot_key, "2024-06-01T10:00:00Z");

        b.confirm().unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);

        b.cancel().unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_confirm_is_pending_only() {
        let mut b = booking();
        b.confirm().unwrap();
        assert!(b.confirm().is_err());
    }

    #[test]
    fn test_cancel_is_not_repeatable() {
        let mut b = booking();
        b.cancel().unwrap();
        assert!(b.cancel().is_err());
    }
}
