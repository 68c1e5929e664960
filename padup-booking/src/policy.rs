use crate::models::{Booking, BookingError, BookingStatus};
use chrono::{DateTime, Duration, Utc};

/// Business rules applied to booking requests beyond what the schema
/// enforces.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Hours before the slot start after which cancellation is refused.
    pub cancellation_cutoff_hours: i64,
}

impl BookingPolicy {
    pub fn new(cancellation_cutoff_hours: i64) -> Self {
        Self {
            cancellation_cutoff_hours,
        }
    }

    /// May `player_id` cancel this booking at `now`?
    pub fn check_cancellation(
        &self,
        booking: &Booking,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if booking.player_id != player_id {
            return Err(BookingError::NotYours);
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::InvalidTransition {
                from: booking.status.to_string(),
                to: "CANCELLED".to_string(),
            });
        }
        let cutoff = booking.starts_at - Duration::hours(self.cancellation_cutoff_hours);
        if now > cutoff {
            return Err(BookingError::CancellationWindowPassed {
                starts_at: booking.starts_at,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padup_core::slot::Slot;
    use uuid::Uuid;

    fn booking_at(starts_at: DateTime<Utc>) -> Booking {
        let slot = Slot::new(starts_at, starts_at + Duration::minutes(90)).unwrap();
        Booking::new(Uuid::new_v4(), "player-1".to_string(), &slot, 3600)
    }

    #[test]
    fn test_cancel_before_cutoff() {
        let policy = BookingPolicy::new(24);
        let booking = booking_at(Utc::now() + Duration::hours(48));
        assert!(policy
            .check_cancellation(&booking, "player-1", Utc::now())
            .is_ok());
    }

    #[test]
    fn test_cancel_inside_cutoff_is_refused() {
        let policy = BookingPolicy::new(24);
        let booking = booking_at(Utc::now() + Duration::hours(2));
        let err = policy
            .check_cancellation(&booking, "player-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, BookingError::CancellationWindowPassed { .. }));
    }

    #[test]
    fn test_cannot_cancel_someone_elses_booking() {
        let policy = BookingPolicy::new(24);
        let booking = booking_at(Utc::now() + Duration::hours(48));
        let err = policy
            .check_cancellation(&booking, "player-2", Utc::now())
            .unwrap_err();
        assert!(matches!(err, BookingError::NotYours));
    }
}
