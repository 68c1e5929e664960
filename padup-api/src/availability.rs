use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use padup_catalog::availability::{SlotGrid, SlotStatus};
use padup_core::slot::SlotId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

const BOOKED_CACHE_TTL_SECONDS: u64 = 60;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub court_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotResponse>,
}

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub slot_key: SlotId,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub status: SlotStatus,
    pub price_cents: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/courts/{court_id}/availability", get(get_availability))
}

/// Day grid for one court. Booked slots are read from the bookings table
/// (cached briefly); held slots are overlaid fresh from the advisory lock
/// area on every request, since holds change by the second.
async fn get_availability(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let court = state
        .courts
        .get_court(court_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::NotFoundError(format!("Court not found: {}", court_id)))?;

    let club = state
        .clubs
        .get_club(court.club_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Club not found: {}", court.club_id)))?;

    let booked = booked_slots(&state, court_id, query.date).await?;
    let held = state.locks.held_slots(court_id).await;

    let slots = SlotGrid::generate(
        &club.opening_hours,
        query.date,
        state.business_rules.slot_minutes,
    );

    let slots = SlotGrid::mark(slots, &booked, &held)
        .into_iter()
        .map(|view| {
            let slot = padup_core::slot::Slot {
                starts_at: view.starts_at,
                ends_at: view.ends_at,
            };
            let context = state.pricing.context_for(view.starts_at);
            let price_cents = state.pricing.quote(&court, &slot, &context);
            SlotResponse {
                slot_key: view.slot_key,
                starts_at: view.starts_at,
                ends_at: view.ends_at,
                status: view.status,
                price_cents,
            }
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        court_id,
        date: query.date,
        slots,
    }))
}

/// Slot keys with a live booking, via the Redis cache when warm. The cache
/// is invalidated by the booking-events worker and expires on its own as a
/// fallback.
async fn booked_slots(
    state: &AppState,
    court_id: Uuid,
    date: NaiveDate,
) -> Result<HashSet<SlotId>, AppError> {
    let date_key = date.to_string();

    if let Ok(Some(cached)) = state
        .redis
        .get_court_availability(&court_id.to_string(), &date_key)
        .await
    {
        if let Ok(keys) = serde_json::from_str::<Vec<SlotId>>(&cached) {
            return Ok(keys.into_iter().collect());
        }
    }

    let bookings = state
        .bookings
        .list_for_court_day(court_id, date)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let keys: Vec<SlotId> = bookings
        .iter()
        .filter_map(|b| SlotId::parse(&b.slot_key).ok())
        .collect();

    if let Ok(payload) = serde_json::to_string(&keys) {
        if let Err(e) = state
            .redis
            .set_court_availability(
                &court_id.to_string(),
                &date_key,
                &payload,
                BOOKED_CACHE_TTL_SECONDS,
            )
            .await
        {
            // Cache is an optimization; the grid is already correct
            debug!("Could not cache availability for {}: {}", court_id, e);
        }
    }

    Ok(keys.into_iter().collect())
}
