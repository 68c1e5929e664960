use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use padup_catalog::club::OpeningHours;
use padup_catalog::court::{Court, Surface};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::clubs::CourtResponse;
use crate::error::AppError;
use crate::middleware::auth::ClubClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCourtRequest {
    pub name: String,
    pub surface: String,
    pub indoor: bool,
    pub base_price_cents: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourtRequest {
    pub name: Option<String>,
    pub surface: Option<String>,
    pub indoor: Option<bool>,
    pub base_price_cents: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct DashboardBooking {
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
        .route("/v1/club/courts", post(create_court))
        .route("/v1/club/courts", get(list_courts))
        .route("/v1/club/courts/{id}", put(update_court))
        .route("/v1/club/courts/{id}", delete(deactivate_court))
        .route("/v1/club/hours", put(update_hours))
        .route("/v1/club/bookings", get(list_club_bookings))
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_court(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
    Json(req): Json<CreateCourtRequest>,
) -> Result<Json<CourtResponse>, AppError> {
    let surface = Surface::from_str(&req.surface)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    if req.base_price_cents <= 0 {
        return Err(AppError::ValidationError(
            "base_price_cents must be positive".to_string(),
        ));
    }

    let court = Court {
        id: Uuid::new_v4(),
        club_id: claims.club_id,
        name: req.name,
        surface,
        indoor: req.indoor,
        base_price_cents: req.base_price_cents,
        is_active: true,
    };

    state
        .courts
        .create_court(&court)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!("Court created: {} for club {}", court.id, claims.club_id);

    Ok(Json(CourtResponse::from(&court)))
}

async fn list_courts(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
) -> Result<Json<Vec<CourtResponse>>, AppError> {
    let courts = state
        .courts
        .list_courts(claims.club_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(courts.iter().map(CourtResponse::from).collect()))
}

/// Load a court and verify it belongs to the authenticated club.
async fn owned_court(
    state: &AppState,
    claims: &ClubClaims,
    court_id: Uuid,
) -> Result<Court, AppError> {
    let court = state
        .courts
        .get_court(court_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Court not found: {}", court_id)))?;

    if court.club_id != claims.club_id {
        return Err(AppError::AuthorizationError(
            "Court belongs to another club".to_string(),
        ));
    }
    Ok(court)
}

async fn update_court(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCourtRequest>,
) -> Result<Json<CourtResponse>, AppError> {
    let mut court = owned_court(&state, &claims, id).await?;

    if let Some(name) = req.name {
        court.name = name;
    }
    if let Some(surface) = req.surface {
        court.surface = Surface::from_str(&surface)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
    }
    if let Some(indoor) = req.indoor {
        court.indoor = indoor;
    }
    if let Some(price) = req.base_price_cents {
        if price <= 0 {
            return Err(AppError::ValidationError(
                "base_price_cents must be positive".to_string(),
            ));
        }
        court.base_price_cents = price;
    }
    if let Some(is_active) = req.is_active {
        court.is_active = is_active;
    }

    state
        .courts
        .update_court(id, &court)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(CourtResponse::from(&court)))
}

async fn deactivate_court(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    owned_court(&state, &claims, id).await?;

    state
        .courts
        .deactivate_court(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!("Court deactivated: {}", id);

    Ok(Json(serde_json::json!({ "id": id, "is_active": false })))
}

async fn update_hours(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
    Json(hours): Json<OpeningHours>,
) -> Result<Json<OpeningHours>, AppError> {
    for day in [
        &hours.monday,
        &hours.tuesday,
        &hours.wednesday,
        &hours.thursday,
        &hours.friday,
        &hours.saturday,
        &hours.sunday,
    ]
    .into_iter()
    .flatten()
    {
        if day.closes_at <= day.opens_at {
            return Err(AppError::ValidationError(
                "closes_at must be after opens_at".to_string(),
            ));
        }
    }

    state
        .clubs
        .update_opening_hours(claims.club_id, &hours)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(hours))
}

async fn list_club_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<ClubClaims>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<DashboardBooking>>, AppError> {
    let bookings = state
        .bookings
        .list_for_club_day(claims.club_id, query.date)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(
        bookings
            .into_iter()
            .map(|b| DashboardBooking {
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
