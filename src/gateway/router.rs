//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::auth::{CertGuard, cert_auth_middleware, error_response};

/// Create the router
///
/// `/private` sits behind the certificate middleware; `/health` does not.
pub fn create_router(guard: Arc<CertGuard>) -> Router {
    let protected = Router::new()
        .route("/private", get(private_handler).post(private_handler))
        .route_layer(middleware::from_fn_with_state(guard, cert_auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .fallback(not_found_handler)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET|POST /private
async fn private_handler() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to private section" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
