use axum::{extract::State, http::Method, response::IntoResponse, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod clubs;
pub mod error;
pub mod locks;
pub mod middleware;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public_routes = Router::new()
        .merge(auth::routes())
        .merge(clubs::routes())
        .merge(availability::routes());

    let player_routes = Router::new()
        .merge(locks::routes())
        .merge(bookings::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::player_auth_middleware,
        ));

    let club_routes = Router::new().merge(admin::routes()).layer(
        axum::middleware::from_fn_with_state(state.clone(), middleware::auth::club_auth_middleware),
    );

    Router::new()
        .merge(public_routes)
        .merge(player_routes)
        .merge(club_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    // Deployed behind a proxy, so the client address comes in a header
    let ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();
    let key = format!("ratelimit:{}", ip);

    match state.redis.check_rate_limit(&key, 100, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
