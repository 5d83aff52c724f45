//! API Routes
//!
//! Configures the Axum router for the admin endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, keys_handler, stats_handler, AdminState};

/// Creates the admin router.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache statistics
/// - `GET /cache/keys` - Cached keys in eviction order
///
/// # Middleware
/// - CORS: Allows any origin with GET
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AdminState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/keys", get(keys_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
