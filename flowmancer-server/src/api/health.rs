//! Health Check API Handler

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "app": state.settings.app_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
