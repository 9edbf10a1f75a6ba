//! HTTP server setup

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Router with CORS and request tracing
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Loopback address the API listens on
pub fn bind_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Serve the API until the listener fails
pub async fn start_server(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = bind_addr(port);
    let network = state.network().await;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%network, "Iron Bank API listening on {}", addr);
    axum::serve(listener, create_app(state)).await
}
