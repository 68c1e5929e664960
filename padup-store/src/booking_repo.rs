use async_trait::async_trait;
use chrono::NaiveDate;
use padup_booking::models::{Booking, BookingStatus};
use padup_booking::repository::{BookingRepoError, BookingRepository};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    court_id: Uuid,
    player_id: String,
    slot_key: String,
    starts_at: chrono::DateTime<chrono::Utc>,
    ends_at: chrono::DateTime<chrono::Utc>,
    price_cents: i32,
    contact_email: Option<String>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, BookingRepoError> {
        let status = BookingStatus::from_str(&self.status)
            .map_err(|e| BookingRepoError::Storage(Box::new(e)))?;
        Ok(Booking {
            id: self.id,
            court_id: self.court_id,
            player_id: self.player_id,
            slot_key: self.slot_key,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            price_cents: self.price_cents,
            contact_email: self.contact_email,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, court_id, player_id, slot_key, starts_at, ends_at, \
                              price_cents, contact_email, status, created_at, updated_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> Result<(), BookingRepoError> {
        let result = sqlx::query(
            "INSERT INTO bookings (id, court_id, player_id, slot_key, starts_at, ends_at, \
             price_cents, contact_email, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(booking.id)
        .bind(booking.court_id)
        .bind(&booking.player_id)
        .bind(&booking.slot_key)
        .bind(booking.starts_at)
        .bind(booking.ends_at)
        .bind(booking.price_cents)
        .bind(&booking.contact_email)
        .bind(booking.status.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!("Booking stored: {} ({})", booking.id, booking.slot_key);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // The partial unique index on (court_id, slot_key) fired:
                // the authoritative "no" for this slot.
                Err(BookingRepoError::SlotTaken)
            }
            Err(e) => Err(BookingRepoError::Storage(e.into())),
        }
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BookingRepoError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BookingRepoError::Storage(e.into()))?;

        row.map(|r| r.into_booking()).transpose()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), BookingRepoError> {
        let result = sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| BookingRepoError::Storage(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(BookingRepoError::NotFound(id));
        }
        Ok(())
    }

    async fn list_for_court_day(
        &self,
        court_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings \
             WHERE court_id = $1 AND starts_at::date = $2 AND status <> 'CANCELLED' \
             ORDER BY starts_at",
            SELECT_COLUMNS
        ))
        .bind(court_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingRepoError::Storage(e.into()))?;

        rows.into_iter().map(|r| r.into_booking()).collect()
    }

    async fn list_for_player(&self, player_id: &str) -> Result<Vec<Booking>, BookingRepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE player_id = $1 ORDER BY starts_at DESC",
            SELECT_COLUMNS
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingRepoError::Storage(e.into()))?;

        rows.into_iter().map(|r| r.into_booking()).collect()
    }

    async fn list_for_club_day(
        &self,
        club_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT b.id, b.court_id, b.player_id, b.slot_key, b.starts_at, b.ends_at, \
             b.price_cents, b.contact_email, b.status, b.created_at, b.updated_at \
             FROM bookings b \
             JOIN courts c ON c.id = b.court_id \
             WHERE c.club_id = $1 AND b.starts_at::date = $2 \
             ORDER BY b.starts_at",
        )
        .bind(club_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingRepoError::Storage(e.into()))?;

        rows.into_iter().map(|r| r.into_booking()).collect()
    }
}
