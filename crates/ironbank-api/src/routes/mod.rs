//! API route handlers

pub mod bank;
pub mod health;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/bank", bank::router())
        .with_state(state)
}
