//! API Module
//!
//! HTTP handlers, middleware and routing for the service.
//!
//! # Endpoints
//! - `GET /api/health` - Health probe
//! - `GET /api/health/readiness` - Readiness probe
//! - `GET /api/health/liveness` - Liveness probe

pub mod handlers;
pub mod middleware;
pub mod respond;
pub mod routes;

pub use handlers::*;
pub use respond::{respond_bad_request, respond_error, respond_internal_error, respond_success};
pub use routes::{create_router, health_routes, with_middleware, API_PREFIX};
