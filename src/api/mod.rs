//! REST API endpoints.
//!
//! Axum-based HTTP API serving current games, monthly standings and the
//! month-by-month listing used for "load previous month" paging.

pub mod routes;
pub mod state;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;
use uuid::Uuid;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
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

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    // Each request gets its own id so the received/completed log lines pair up.
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/games/current", get(routes::games::current_games))
        .route("/api/games/finished", get(routes::games::finished_games))
        .route("/api/games/month", get(routes::games::month_games))
        .fallback(not_found)
        .layer(cors)
        .layer(trace)
        .with_state(state)
}

async fn not_found(request: Request<Body>) -> ApiError {
    ApiError::NotFound(request.uri().path().to_string())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
}
