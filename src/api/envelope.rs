//! Consistent response envelope for all API endpoints.
//!
//! Every response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::error::MarketError;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "1",
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Response {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status(status: StatusCode, data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
    }

    /// Map a service error to its HTTP status and stable code.
    pub fn from_market_error(err: &MarketError) -> Response {
        let status = match err {
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MarketError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::build(status, err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistenceError;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_shape() {
        let resp = ApiResponse::ok(serde_json::json!({"hello": "world"}));
        assert_eq!(resp.status(), StatusCode::OK);

        let v = body_json(resp).await;
        assert_eq!(v["data"]["hello"], "world");
        assert_eq!(v["meta"]["version"], "1");
    }

    #[tokio::test]
    async fn test_market_error_mapping() {
        let cases = [
            (MarketError::NotFound("crop".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (MarketError::Validation("qty".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                MarketError::ModelUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_UNAVAILABLE",
            ),
            (
                MarketError::Persistence(PersistenceError::Storage("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let resp = ApiErrorResponse::from_market_error(&err);
            assert_eq!(resp.status(), status);
            let v = body_json(resp).await;
            assert_eq!(v["error"]["code"], code);
            assert_eq!(v["error"]["message"], err.to_string());
        }
    }
}
