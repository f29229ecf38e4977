//! REST API endpoints.
//!
//! Axum-based HTTP API that proxies the benchmark API and adds the derived
//! views the dashboard needs: challenge summaries, forecast plots and the
//! duration helpers.

pub mod cache;
pub mod context;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::client::ClientError;
use crate::duration::DurationError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The benchmark API answered with an error status or could not be reached
    #[error("Upstream error: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Upstream { status, .. } => (*status, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NotFound(path) => ApiError::NotFound(path),
            ClientError::HttpStatus { status, message } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            ClientError::Http(e) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: e.to_string(),
            },
            ClientError::Json(e) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: format!("invalid response body: {}", e),
            },
            ClientError::InvalidUrl(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<DurationError> for ApiError {
    fn from(e: DurationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// Build the application router.
///
/// `cors_origin` of `"*"` (or empty) allows any origin.
pub fn build_router(state: AppState, access_log: bool, cors_origin: &str) -> Router {
    let api = Router::new()
        .route("/challenges", get(routes::challenges::list_challenges))
        .route(
            "/challenges/upcoming",
            get(routes::challenges::upcoming_challenges),
        )
        .route("/challenges/:id", get(routes::challenges::challenge_detail))
        .route(
            "/challenges/:id/series",
            get(routes::challenges::challenge_series),
        )
        .route(
            "/challenges/:id/series/:series_id/data",
            get(routes::challenges::series_data),
        )
        .route(
            "/challenges/:id/series/:series_id/forecasts",
            get(routes::challenges::series_forecasts),
        )
        .route(
            "/challenges/:id/series/:series_id/plot",
            get(routes::challenges::series_plot),
        )
        .route("/challenges/:id/plot", get(routes::challenges::challenge_plot))
        .route(
            "/challenges/:id/models",
            get(routes::challenges::challenge_models),
        )
        .route("/models/rankings", get(routes::rankings::rankings))
        .route(
            "/models/ranking-filters",
            get(routes::rankings::ranking_filters),
        )
        .route("/models/:model_id", get(routes::models::model_detail))
        .route(
            "/models/:model_id/rankings",
            get(routes::models::model_rankings),
        )
        .route(
            "/models/:model_id/series-by-definition",
            get(routes::models::model_series_by_definition),
        )
        .route(
            "/models/:model_id/definitions/:definition_id/series/:series_id/forecasts",
            get(routes::models::model_series_forecasts),
        )
        .route(
            "/definitions/:definition_id/rounds",
            get(routes::rounds::definition_rounds),
        )
        .route("/rounds/metadata", get(routes::rounds::rounds_metadata))
        .route("/durations/:value", get(routes::durations::describe_duration))
        .route("/horizon-steps", get(routes::durations::horizon_steps));

    let router = Router::new()
        .route("/health", get(routes::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(middleware::from_fn(context::request_id))
        .layer(cors_layer(cors_origin));

    if access_log {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin.is_empty() || origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_not_found_maps_to_404() {
        let err = ApiError::from(ClientError::NotFound("/api/v1/challenges/9".into()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_client_status_is_passed_through() {
        let err = ApiError::from(ClientError::HttpStatus {
            status: 503,
            message: "maintenance".into(),
        });
        assert!(matches!(
            &err,
            ApiError::Upstream { status, message }
                if *status == StatusCode::SERVICE_UNAVAILABLE && message == "maintenance"
        ));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_upstream_status_is_bad_gateway() {
        let err = ApiError::from(ClientError::HttpStatus {
            status: 1000,
            message: "odd".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_json_error_is_bad_gateway() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = ApiError::from(ClientError::Json(json_err));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_duration_error_is_bad_request() {
        let err = ApiError::from(DurationError::InvalidFormat("1 day".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
