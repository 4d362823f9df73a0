//! HTTP API handlers and routes using axum.
//!
//! Routes:
//! - GET /health - Health check (includes a storage round-trip)
//! - GET /stats - Cache statistics
//! - GET /orders/{order_uid} - Canonical JSON for one order
//!
//! Any other path is served from the static directory when one is configured.

use crate::cache::CacheStats;
use crate::service::OrderService;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::error;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: OrderService,
    /// Directory served for paths outside the API, if any.
    pub static_dir: Option<PathBuf>,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health and stats
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        // Order lookup
        .route("/orders", get(missing_id_handler))
        .route("/orders/", get(missing_id_handler))
        .route("/orders/{order_uid}", get(get_order_handler));

    if let Some(dir) = &state.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
/// GET /health
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    let store = state.service.store();
    match store.health_check().await {
        Ok(()) => Json(HealthResponse {
            status: "ok",
            store: store.backend_name(),
        })
        .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    store: store.backend_name(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
}

/// Cache statistics.
/// GET /stats
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatsResponse {
        cache: state.service.cache().stats(),
        store: state.service.store().backend_name(),
    })
}

#[derive(Serialize)]
struct StatsResponse {
    cache: CacheStats,
    store: &'static str,
}

/// Get one order by id.
/// GET /orders/{order_uid}
async fn get_order_handler(
    State(state): State<Arc<AppState>>,
    Path(order_uid): Path<String>,
) -> Result<Response, ApiError> {
    if order_uid.is_empty() {
        return Err(ApiError::BadRequest("missing order id".to_string()));
    }

    match state.service.get_by_id(&order_uid).await {
        Ok(Some(body)) => Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response()),
        Ok(None) => Err(ApiError::NotFound(format!(
            "Order '{}' not found",
            order_uid
        ))),
        Err(e) => {
            error!("Get order {}: {}", order_uid, e);
            Err(ApiError::InternalError("internal error".to_string()))
        }
    }
}

/// GET /orders and GET /orders/
async fn missing_id_handler() -> ApiError {
    ApiError::BadRequest("missing order id".to_string())
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error types.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}
