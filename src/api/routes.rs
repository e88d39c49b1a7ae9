//! API routes for the delivery service

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheHealth, HealthStatus, HybridCache};
use crate::models::DeliveryRequest;
use crate::service::DeliveryService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: Arc<DeliveryService>,
    pub cache: Arc<HybridCache>,
}

/// Query parameters of the delivery endpoint.
#[derive(Debug, Deserialize)]
pub struct DeliveryParams {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub state: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health endpoint response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub cache: CacheHealth,
}

/// `GET /v1/delivery` — the delivery decision endpoint.
///
/// 200 with a JSON array on matches, 204 on an empty result, 400 with a
/// stable message on validation failures, 500 on internal errors.
pub async fn get_campaigns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeliveryParams>,
) -> Response {
    let mut request = DeliveryRequest::new(params.country, params.os, params.app);
    request.state = params.state;

    match state.service.get_campaigns(&request).await {
        Ok(campaigns) if campaigns.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(campaigns) => (StatusCode::OK, Json(campaigns)).into_response(),
        Err(err) => {
            let status = if err.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `GET /health` — composite service health, 503 when the cache is
/// unhealthy.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let cache = state.cache.health().await;

    let status_code = if cache.overall == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: cache.overall.to_string(),
            service: "adrelay".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_params_default_to_empty() {
        let params: DeliveryParams = serde_json::from_str("{}").unwrap();
        assert!(params.country.is_empty());
        assert!(params.os.is_empty());
        assert!(params.app.is_empty());
        assert!(params.state.is_empty());
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            error: "country is required".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"country is required"}"#
        );
    }
}
