// HTTP routes and request-level error mapping

mod http;
mod identity;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::models::ErrorResponse;
use crate::readings_repo::ReadingsRepo;
use crate::site_repo::SiteRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readings: Arc<ReadingsRepo>,
    pub(crate) sites: Arc<SiteRepo>,
    pub(crate) config: AppConfig,
}

/// Request failure taxonomy. Per-site computation errors never surface here;
/// they ride inside a successful response as ERROR entries.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            ApiError::Internal(e) => {
                tracing::warn!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

pub fn app(readings: Arc<ReadingsRepo>, sites: Arc<SiteRepo>, config: AppConfig) -> Router {
    let state = AppState {
        readings,
        sites,
        config,
    };
    Router::new()
        .route("/", get(|| async { "fuelmon: fuel monitoring API" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route("/api/readings/cumulative", post(http::cumulative_day_handler)) // POST /api/readings/cumulative
        .route("/api/readings/cumulative/range", get(http::cumulative_range_handler)) // GET /api/readings/cumulative/range
        .route("/api/dashboard", get(http::dashboard_handler)) // GET /api/dashboard
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
