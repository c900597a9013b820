//! Service endpoints

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tracing::{debug, instrument};

use crate::state::AppState;

/// Create API router
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check endpoint
#[instrument]
async fn health_check() -> impl IntoResponse {
    debug!("Health check requested");
    Json(json!({
        "status": "ok",
        "service": "relayctl",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339()
    }))
}
