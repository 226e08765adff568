use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{PricingInput, PricingResult, VehicleType};
use crate::state::AppState;

// GET /api/corridors
#[derive(Serialize)]
pub struct CorridorResponse {
    key: String,
    display_name: String,
    distance_km: f64,
    nights: i32,
    return_allowance: i64,
}

pub async fn list_corridors(State(state): State<Arc<AppState>>) -> Json<Vec<CorridorResponse>> {
    let engine = state.pricing.engine();
    let corridors = engine
        .catalog()
        .iter()
        .map(|c| CorridorResponse {
            key: c.key.clone(),
            display_name: c.display_name.clone(),
            distance_km: c.distance_km,
            nights: c.nights,
            return_allowance: c.return_allowance.whole_units(),
        })
        .collect();
    Json(corridors)
}

// POST /api/quote
#[derive(Deserialize)]
pub struct QuoteRequest {
    /// Required unless `corridor_key` names a known corridor.
    pub distance_km: Option<f64>,
    pub nights: Option<i32>,
    pub corridor_key: Option<String>,
    #[serde(default)]
    pub waiting_hours: f64,
    #[serde(default)]
    pub after_hours: bool,
    pub platform_commission_rate: Option<f64>,
    #[serde(default)]
    pub vehicle_type: VehicleType,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    corridor: Option<String>,
    distance_km: f64,
    nights: i32,
    #[serde(flatten)]
    pricing: PricingResult,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let engine = state.pricing.engine();

    let corridor = match req.corridor_key.as_deref() {
        Some(key) => match engine.catalog().lookup(key) {
            Ok(corridor) => Some(corridor),
            Err(e) => {
                tracing::debug!(error = %e, "quoting as custom route");
                None
            }
        },
        None => None,
    };

    let distance_km = req
        .distance_km
        .or(corridor.map(|c| c.distance_km))
        .ok_or_else(|| AppError::BadRequest("distance_km is required for custom routes".to_string()))?;
    let nights = req.nights.or(corridor.map(|c| c.nights)).unwrap_or(0);

    let input = PricingInput {
        distance_km,
        nights,
        corridor_key: corridor.map(|c| c.key.clone()),
        waiting_hours: req.waiting_hours,
        after_hours: req.after_hours,
        platform_commission_rate: req
            .platform_commission_rate
            .unwrap_or_else(|| engine.default_commission_rate()),
        vehicle_type: req.vehicle_type,
    };
    let pricing = engine.calculate(&input)?;

    Ok(Json(QuoteResponse {
        corridor: input.corridor_key,
        distance_km,
        nights,
        pricing,
    }))
}
