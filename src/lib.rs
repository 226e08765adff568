pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/whatsapp", post(handlers::webhook::whatsapp_webhook))
        .route("/api/corridors", get(handlers::quote::list_corridors))
        .route("/api/quote", post(handlers::quote::quote))
        .route(
            "/api/admin/pricing",
            get(handlers::admin::get_pricing).put(handlers::admin::update_pricing),
        )
        .route(
            "/api/admin/pricing/corridor/:key",
            put(handlers::admin::update_corridor_allowance),
        )
        .route("/api/admin/pricing/reload", post(handlers::admin::reload_pricing))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route("/api/admin/bookings/:code", get(handlers::admin::get_booking))
        .route(
            "/api/admin/bookings/:code/status",
            post(handlers::admin::update_booking_status),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
