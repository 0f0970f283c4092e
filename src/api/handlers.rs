//! API handlers.
//!
//! All handlers return `Response` via [`ApiResponse`] or [`ApiErrorResponse`].

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::market::{FarmerRequest, Marketplace, SupplyRequest};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ExchangeState {
    pub market: Arc<Marketplace>,
    pub started_at: Instant,
}

impl ExchangeState {
    pub fn new(market: Arc<Marketplace>) -> Self {
        Self {
            market,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Recommendation
// ============================================================================

/// POST /api/v1/recommend_fertilizer
pub async fn recommend_fertilizer(
    State(state): State<ExchangeState>,
    payload: Result<Json<FarmerRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    match state.market.recommend(&request).await {
        Ok(recommendation) => ApiResponse::ok(recommendation),
        Err(e) => ApiErrorResponse::from_market_error(&e),
    }
}

// ============================================================================
// Offers
// ============================================================================

/// Manual listing without a photo.
#[derive(Debug, Deserialize)]
pub struct ManualOfferRequest {
    pub producer_id: String,
    pub waste_type: String,
    pub quantity_kg: f64,
    pub cost_per_kg: f64,
}

impl From<ManualOfferRequest> for SupplyRequest {
    fn from(req: ManualOfferRequest) -> Self {
        Self {
            producer_id: req.producer_id,
            cost_per_kg: req.cost_per_kg,
            image: None,
            manual_waste_type: Some(req.waste_type),
            manual_quantity_kg: Some(req.quantity_kg),
        }
    }
}

/// POST /api/v1/offers
pub async fn create_offer(
    State(state): State<ExchangeState>,
    payload: Result<Json<ManualOfferRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    match state.market.submit_offer(request.into()).await {
        Ok(receipt) => ApiResponse::created(receipt),
        Err(e) => ApiErrorResponse::from_market_error(&e),
    }
}

/// POST /api/v1/upload/photo
///
/// Multipart form: optional `file`, required `cost_per_kg` and `producer_id`,
/// optional `manual_waste_type` and `manual_quantity_kg`.
pub async fn upload_photo(State(state): State<ExchangeState>, multipart: Multipart) -> Response {
    let request = match read_supply_form(multipart).await {
        Ok(r) => r,
        Err(FormError::Multipart(e)) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return ApiErrorResponse::payload_too_large(e.body_text())
        }
        Err(FormError::Multipart(e)) => return ApiErrorResponse::bad_request(e.body_text()),
        Err(FormError::Field(msg)) => return ApiErrorResponse::bad_request(msg),
    };

    match state.market.submit_offer(request).await {
        Ok(receipt) => ApiResponse::created(receipt),
        Err(e) => ApiErrorResponse::from_market_error(&e),
    }
}

enum FormError {
    Multipart(MultipartError),
    Field(String),
}

impl From<MultipartError> for FormError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

fn parse_number(field: &str, text: &str) -> Result<f64, FormError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| FormError::Field(format!("form field '{field}' must be a number, got '{text}'")))
}

/// Blank text fields count as absent.
async fn read_supply_form(mut multipart: Multipart) -> Result<SupplyRequest, FormError> {
    let mut request = SupplyRequest::default();
    let mut cost_per_kg = None;
    let mut producer_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                request.image = Some(bytes.to_vec());
            }
            continue;
        }

        let text = field.text().await?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match name.as_str() {
            "cost_per_kg" => cost_per_kg = Some(parse_number(&name, text)?),
            "producer_id" => producer_id = Some(text.to_string()),
            "manual_waste_type" => request.manual_waste_type = Some(text.to_string()),
            "manual_quantity_kg" => request.manual_quantity_kg = Some(parse_number(&name, text)?),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    request.cost_per_kg = cost_per_kg
        .ok_or_else(|| FormError::Field("missing form field 'cost_per_kg'".to_string()))?;
    request.producer_id = producer_id
        .ok_or_else(|| FormError::Field("missing form field 'producer_id'".to_string()))?;
    Ok(request)
}

#[derive(Debug, Deserialize)]
pub struct OffersQuery {
    pub waste_type: Option<String>,
}

/// GET /api/v1/offers
pub async fn list_offers(
    State(state): State<ExchangeState>,
    Query(query): Query<OffersQuery>,
) -> Response {
    ApiResponse::ok(state.market.available_offers(query.waste_type.as_deref()))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub offers: usize,
    pub store: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<ExchangeState>) -> Json<HealthResponse> {
    let ledger = state.market.ledger();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        offers: ledger.len(),
        store: ledger.backend_name(),
    })
}
