//! Liveness endpoints.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/health", get(health_check))
}

/// GET /api/ping — Liveness probe used by the frontend.
async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "ledgerlens-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
