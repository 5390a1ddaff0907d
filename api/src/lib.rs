//! HTTP surface of the FAQ assistant: `GET /health` and `POST /predict`.

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use contextor::Pipeline;
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::app_state::{AppState, DEFAULT_API_ADDRESS, api_address_from_env};
pub use crate::error_handler::{AppError, INTERNAL_ERROR_REPLY};

use crate::routes::{health_route::health, predict::predict_route::predict};

/// Builds the application router around a shared pipeline.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let state = Arc::new(AppState::new(pipeline));
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

/// Serves the API on `address` until Ctrl+C.
pub async fn start(pipeline: Arc<Pipeline>, address: &str) -> Result<(), AppError> {
    let app = router(pipeline);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| AppError::Bind {
            addr: address.to_string(),
            source,
        })?;
    info!("listening on {address}");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
