use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use padup_catalog::club::{Club, OpeningHours};
use padup_catalog::court::Court;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ClubSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ClubDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub opening_hours: OpeningHours,
    pub courts: Vec<CourtResponse>,
}

#[derive(Debug, Serialize)]
pub struct CourtResponse {
    pub id: Uuid,
    pub name: String,
    pub surface: String,
    pub indoor: bool,
    pub base_price_cents: i32,
}

impl From<&Court> for CourtResponse {
    fn from(court: &Court) -> Self {
        Self {
            id: court.id,
            name: court.name.clone(),
            surface: court.surface.as_str().to_string(),
            indoor: court.indoor,
            base_price_cents: court.base_price_cents,
        }
    }
}

impl From<&Club> for ClubSummaryResponse {
    fn from(club: &Club) -> Self {
        Self {
            id: club.id,
            name: club.name.clone(),
            city: club.city.clone(),
            address: club.address.clone(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/clubs", get(list_clubs))
        .route("/v1/clubs/{id}", get(get_club))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_clubs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClubSummaryResponse>>, AppError> {
    let clubs = state
        .clubs
        .list_clubs()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(clubs.iter().map(ClubSummaryResponse::from).collect()))
}

async fn get_club(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClubDetailResponse>, AppError> {
    let club = state
        .clubs
        .get_club(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::NotFoundError(format!("Club not found: {}", id)))?;

    let courts = state
        .courts
        .list_courts(club.id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(ClubDetailResponse {
        id: club.id,
        name: club.name,
        city: club.city,
        address: club.address,
        email: club.email,
        phone: club.phone,
        description: club.description,
        opening_hours: club.opening_hours,
        courts: courts.iter().map(CourtResponse::from).collect(),
    }))
}
