use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::PlayerClaims, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    player_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

/// Anonymous player session. Account-backed sign-in lives with the hosted
/// identity provider; it shares the secret and mints the same claims.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let player_id = format!("player-{}", Uuid::new_v4());
    let my_claims = PlayerClaims {
        sub: player_id.clone(),
        role: "PLAYER".to_owned(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token, player_id }))
}
