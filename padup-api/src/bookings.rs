use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use padup_booking::models::{Booking, BookingError, BookingStatus};
use padup_booking::reconcile::{reconcile_commit, CommitOutcome};
use padup_core::lock::LockState;
use padup_core::slot::{Slot, SlotId};
use padup_core::tab::TabId;
use padup_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::PlayerClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub court_id: Uuid,
    /// RFC 3339 slot start, any offset.
    pub slot: String,
    pub tab_id: String,
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    status: String,
    price_cents: i32,
}

#[derive(Debug, Serialize)]
struct BookingListItem {
    id: Uuid,
    court_id: Uuid,
    slot_key: String,
    starts_at: chrono::DateTime<chrono::Utc>,
    ends_at: chrono::DateTime<chrono::Utc>,
    price_cents: i32,
    status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(commit_booking))
        .route("/v1/bookings", get(list_my_bookings))
        .route("/v1/bookings/{id}", delete(cancel_booking))
}

// ============================================================================
// Handlers
// ============================================================================

async fn commit_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let slot_id = SlotId::parse(&req.slot)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let tab = TabId::new(req.tab_id);

    // 1. Court must exist and be bookable
    let court = state
        .courts
        .get_court(req.court_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::NotFoundError(format!("Court not found: {}", req.court_id)))?;

    // 2. The caller's tab must still hold the advisory lock it took when
    //    opening the booking form
    let manager = state.locks.for_court(req.court_id).await;
    match manager
        .state(&slot_id, &tab)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
    {
        LockState::HeldBySelf => {}
        LockState::HeldByOther { owner_tab, .. } => {
            return Err(AppError::ConflictError(format!(
                "Slot is being booked from another tab ({})",
                owner_tab
            )));
        }
        LockState::Free => {
            return Err(AppError::ValidationError(
                "Hold expired or missing, re-select the slot".to_string(),
            ));
        }
    }

    // 3. Price the slot
    let starts_at = slot_id.starts_at();
    let slot = Slot::new(
        starts_at,
        starts_at + Duration::minutes(state.business_rules.slot_minutes as i64),
    )
    .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let context = state.pricing.context_for(starts_at);
    let price_cents = state.pricing.quote(&court, &slot, &context);

    // 4. Insert; the partial unique index is the conflict arbiter
    let mut booking = Booking::new(court.id, claims.sub.clone(), &slot, price_cents);
    booking.contact_email = req.contact_email;
    booking
        .confirm()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = state.bookings.create_booking(&booking).await;

    // 5. Reconcile advisory state with the authoritative outcome
    match reconcile_commit(&manager, &slot_id, &tab, result).await {
        CommitOutcome::Confirmed => {
            let event = BookingConfirmedEvent {
                booking_id: booking.id,
                court_id: court.id,
                slot_key: booking.slot_key.clone(),
                player_id: claims.sub,
                timestamp: Utc::now().timestamp(),
            };
            state.kafka.publish_booking_confirmed(&event).await;

            info!("Booking confirmed: {} ({})", booking.id, booking.slot_key);

            Ok(Json(BookingResponse {
                booking_id: booking.id,
                status: BookingStatus::Confirmed.to_string(),
                price_cents,
            }))
        }
        CommitOutcome::SlotTaken => Err(AppError::ConflictError(
            "Slot already booked".to_string(),
        )),
        CommitOutcome::Retry(reason) => Err(AppError::InternalServerError(reason)),
    }
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking not found: {}", id)))?;

    state
        .policy
        .check_cancellation(&booking, &claims.sub, Utc::now())
        .map_err(|e| match e {
            BookingError::NotYours => AppError::AuthorizationError(e.to_string()),
            BookingError::CancellationWindowPassed { .. } => {
                AppError::ValidationError(e.to_string())
            }
            other => AppError::ConflictError(other.to_string()),
        })?;

    state
        .bookings
        .update_status(id, BookingStatus::Cancelled)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let event = BookingCancelledEvent {
        booking_id: booking.id,
        court_id: booking.court_id,
        slot_key: booking.slot_key.clone(),
        player_id: claims.sub,
        timestamp: Utc::now().timestamp(),
    };
    state.kafka.publish_booking_cancelled(&event).await;

    info!("Booking cancelled: {} ({})", booking.id, booking.slot_key);

    Ok(Json(BookingResponse {
        booking_id: booking.id,
        status: BookingStatus::Cancelled.to_string(),
        price_cents: booking.price_cents,
    }))
}

async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<PlayerClaims>,
) -> Result<Json<Vec<BookingListItem>>, AppError> {
    let bookings = state
        .bookings
        .list_for_player(&claims.sub)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(
        bookings
            .into_iter()
            .map(|b| BookingListItem {
                id: b.id,
                court_id: b.court_id,
                slot_key: b.slot_key,
                starts_at: b.starts_at,
                ends_at: b.ends_at,
                price_cents: b.price_cents,
                status: b.status.to_string(),
            })
            .collect(),
    ))
}
