use crate::models::{Booking, BookingStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Booking persistence errors. `SlotTaken` surfaces the unique index on
/// `(court_id, slot_key)` — the authoritative conflict decision.
#[derive(Debug, thiserror::Error)]
pub enum BookingRepoError {
    #[error("Slot already booked")]
    SlotTaken,

    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking. Fails with `SlotTaken` when another booking
    /// already holds the court/slot pair.
    async fn create_booking(&self, booking: &Booking) -> Result<(), BookingRepoError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BookingRepoError>;

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), BookingRepoError>;

    /// Confirmed bookings of one court on one day (for the availability grid).
    async fn list_for_court_day(
        &self,
        court_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepoError>;

    async fn list_for_player(&self, player_id: &str) -> Result<Vec<Booking>, BookingRepoError>;

    /// All bookings of one club on one day (dashboard view).
    async fn list_for_club_day(
        &self,
        club_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepoError>;
}
