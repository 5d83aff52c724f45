//! Admin API Module
//!
//! Read-only HTTP endpoints for inspecting the proxy cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /cache/keys` - Cached keys in eviction order

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
