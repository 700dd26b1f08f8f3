use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entries;
pub mod events;
pub mod referees;
pub mod response;
pub mod roster;
pub mod standings;
pub mod state;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(events::router())
        .merge(referees::router())
        .merge(entries::router())
        .merge(roster::router())
        .merge(standings::router())
}

pub async fn app_with_state(state: AppState) -> Router {
    let cors = if state.config.allow_any_origin { CorsLayer::permissive() } else { CorsLayer::new() };
    Router::new()
        .nest("/api", api_router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
