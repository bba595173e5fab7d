pub mod products;
pub mod ws;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let connections = state.registry.len().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "inventory-stock-service",
            "ws_connections": connections,
        })),
    )
}
