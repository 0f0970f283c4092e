//! REST API module using Axum
//!
//! HTTP surface of the exchange. Every `/api/v1` response uses the
//! `{data, meta}` / `{error, meta}` envelope; `/health` is a plain probe.

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ExchangeState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `EXCHANGE_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for browser front-ends served elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("EXCHANGE_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: ExchangeState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::health_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::test_support::{marketplace, FixedClassifier};
    use crate::storage::InMemorySink;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn create_test_state() -> ExchangeState {
        let market = marketplace(FixedClassifier(0), Arc::new(InMemorySink::new())).await;
        ExchangeState::new(Arc::new(market))
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(create_test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["store"], "InMemory");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_app(create_test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = create_app(create_test_state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/recommend_fertilizer")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
