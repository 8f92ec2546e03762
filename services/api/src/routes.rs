//! API service routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;

use crate::{middleware::auth_middleware, state::AppState, websocket::ws_handler};

pub mod auth;
pub mod bets;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/bets", get(bets::list_bets).post(bets::create_bet))
        .route("/bets/:id", get(bets::get_bet))
        .route("/bets/:id/wagers", post(bets::place_wager))
        .route("/bets/:id/status", patch(bets::transition_bet))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/ws", get(ws_handler))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}
