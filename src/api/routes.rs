//! API route definitions
//!
//! - /api/v1/recommend_fertilizer - soil test to recommended waste and sellers
//! - /api/v1/offers - list available offers, or create one from JSON
//! - /api/v1/upload/photo - create an offer from a photo and/or manual fields

use axum::extract::DefaultBodyLimit;
use axum::{routing::{get, post}, Router};

use super::handlers::{self, ExchangeState};
use crate::config::defaults::MAX_UPLOAD_BYTES;

/// Create all v1 API routes
pub fn api_routes(state: ExchangeState) -> Router {
    Router::new()
        .route("/recommend_fertilizer", post(handlers::recommend_fertilizer))
        .route("/offers", get(handlers::list_offers).post(handlers::create_offer))
        .route(
            "/upload/photo",
            post(handlers::upload_photo).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: ExchangeState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
