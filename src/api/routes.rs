//! API Routes
//!
//! Configures the Axum router and its middleware stack.

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, liveness_handler, readiness_handler};
use super::middleware::{cors_layer, handle_panic, log_response, request_span, translate_errors};
use crate::config::ServerConfig;

/// Common path prefix for every endpoint.
pub const API_PREFIX: &str = "/api";

/// Health probe routes, relative to [`API_PREFIX`].
///
/// # Endpoints
/// - `GET /health` - General health probe
/// - `GET /health/readiness` - Readiness probe
/// - `GET /health/liveness` - Liveness probe
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/readiness", get(readiness_handler))
        .route("/health/liveness", get(liveness_handler))
}

/// Wraps routes in the middleware stack.
///
/// # Middleware (outermost first)
/// - Panic recovery: a panicking handler yields a 500 error envelope
/// - Request logging: method, path, query, client IP, status, latency
/// - Error translation: recorded handler errors become a 500 envelope
/// - CORS: any origin, method and header; answers preflight requests
/// - Timeouts: request body read and response production bounds; a zero
///   duration leaves that bound off
pub fn with_middleware(routes: Router, config: &ServerConfig) -> Router {
    let write_timeout = nonzero(config.write_timeout).map(TimeoutLayer::new);
    let read_timeout = nonzero(config.read_timeout).map(RequestBodyTimeoutLayer::new);
    let trace = TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_response(log_response)
        .on_failure(());

    routes.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(trace)
            .layer(middleware::from_fn(translate_errors))
            .layer(cors_layer())
            .option_layer(write_timeout)
            .option_layer(read_timeout),
    )
}

fn nonzero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// Creates the main router with all endpoints configured.
pub fn create_router(config: &ServerConfig) -> Router {
    let app = Router::new().nest(API_PREFIX, health_routes());
    with_middleware(app, config)
}
