use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PricingResult};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if expected_token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/pricing
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PricingConfig>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.pricing.engine().config().clone()))
}

// PUT /api/admin/pricing
pub async fn update_pricing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut config): Json<PricingConfig>,
) -> Result<Json<PricingConfig>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    stamp(&mut config);
    let engine = state.pricing.update(config)?;
    Ok(Json(engine.config().clone()))
}

// PUT /api/admin/pricing/corridor/:key
#[derive(Deserialize)]
pub struct CorridorAllowanceRequest {
    /// Whole shillings.
    pub return_allowance: i64,
    pub updated_by: Option<String>,
}

pub async fn update_corridor_allowance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(body): Json<CorridorAllowanceRequest>,
) -> Result<Json<PricingConfig>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let current = state.pricing.engine();
    current
        .catalog()
        .lookup(&key)
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    if body.return_allowance < 0 {
        return Err(AppError::BadRequest("return_allowance must not be negative".to_string()));
    }

    let mut config = current.config().clone();
    config.corridor_allowances.insert(key.clone(), body.return_allowance);
    config.updated_by = body.updated_by;
    stamp(&mut config);

    let engine = state.pricing.update(config)?;
    tracing::info!(corridor = %key, allowance = body.return_allowance, "corridor allowance updated");
    Ok(Json(engine.config().clone()))
}

// POST /api/admin/pricing/reload
pub async fn reload_pricing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let engine = state.pricing.reload()?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "rate_per_km": engine.config().rate_per_km,
        "corridors": engine.catalog().len(),
        "last_updated": engine.config().last_updated,
    })))
}

fn stamp(config: &mut PricingConfig) {
    config.last_updated = Some(Utc::now().to_rfc3339());
    if config.updated_by.is_none() {
        config.updated_by = Some("admin".to_string());
    }
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    booking_code: String,
    client_phone: String,
    pickup_location: String,
    destination: String,
    vehicle_type: String,
    pickup_date: String,
    corridor_key: Option<String>,
    distance_km: f64,
    nights: i32,
    status: String,
    customer_total: i64,
    driver_payout: i64,
    pricing: PricingResult,
    payment_proof_url: Option<String>,
    payment_notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            customer_total: b.pricing.customer_total.whole_units(),
            driver_payout: b.pricing.driver_payout.whole_units(),
            booking_code: b.booking_code,
            client_phone: b.client_phone,
            pickup_location: b.pickup_location,
            destination: b.destination,
            vehicle_type: b.vehicle_type.as_str().to_string(),
            pickup_date: b.pickup_date.format("%Y-%m-%d").to_string(),
            corridor_key: b.corridor_key,
            distance_km: b.distance_km,
            nights: b.nights,
            status: b.status.as_str().to_string(),
            pricing: b.pricing,
            payment_proof_url: b.payment_proof_url,
            payment_notes: b.payment_notes,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(raw).ok_or_else(|| AppError::BadRequest(format!("unknown booking status: {raw}")))
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let status_filter = query.status.as_deref().map(parse_status).transpose()?;

    let bookings = state.bookings.list(status_filter, limit).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// GET /api/admin/bookings/:code
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = state
        .bookings
        .find_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {code}")))?;
    Ok(Json(booking.into()))
}

// POST /api/admin/bookings/:code/status
#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = parse_status(&body.status)?;
    state.bookings.update_status(&code, status).await?;
    tracing::info!(code = %code, status = status.as_str(), "booking status updated by admin");

    let booking = state
        .bookings
        .find_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {code}")))?;
    Ok(Json(booking.into()))
}
