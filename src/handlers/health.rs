use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let engine = state.pricing.engine();
    Json(serde_json::json!({
        "status": "ok",
        "corridors": engine.catalog().len(),
        "messaging": if state.config.has_twilio_credentials() { "twilio" } else { "log_only" },
    }))
}
