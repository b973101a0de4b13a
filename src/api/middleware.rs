//! Middleware
//!
//! Request logging, panic recovery, error translation and CORS policy.

use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request},
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH},
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{error, info, info_span, Span};

use crate::error::RecordedError;
use crate::models::ErrorResponse;

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

// == Client IP ==
/// Best-effort client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

// == Request Logging ==
/// Opens the per-request span carrying method, path, query and client IP.
pub fn request_span(request: &Request) -> Span {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        query = request.uri().query().unwrap_or(""),
        ip = %client_ip(request.headers(), peer),
    )
}

/// Logs the response status and latency once the handler has completed.
pub fn log_response(response: &Response, latency: Duration, _span: &Span) {
    info!(
        status = response.status().as_u16(),
        latency_ms = latency.as_secs_f64() * 1000.0,
        "HTTP request"
    );
}

// == Panic Recovery ==
/// Converts a handler panic into a 500 error envelope.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "request handler panicked");

    let body = ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        INTERNAL_ERROR_MESSAGE,
        None,
    );
    // produced outside the CORS layer, so the origin header is set here
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(body),
    )
        .into_response()
}

// == Error Translation ==
/// Writes the error envelope for handler errors that were recorded but
/// not written.
///
/// Responses that already carry a body pass through untouched.
pub async fn translate_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (mut parts, body) = next.run(request).await.into_parts();
    let Some(recorded) = parts.extensions.remove::<RecordedError>() else {
        return Response::from_parts(parts, body);
    };

    error!(
        error = %recorded.message(),
        path = %path,
        method = %method,
        "request handling error"
    );

    let envelope = Json(ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        INTERNAL_ERROR_MESSAGE,
        Some(recorded.message().to_string()),
    ))
    .into_response();
    let (envelope_parts, envelope_body) = envelope.into_parts();

    // headers set further in (CORS) stay on the response
    parts.status = StatusCode::INTERNAL_SERVER_ERROR;
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.extend(envelope_parts.headers);
    Response::from_parts(parts, envelope_body)
}

// == CORS ==
/// Allows cross-origin requests from any origin, with any method and
/// headers. Preflight `OPTIONS` requests are answered directly.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        let peer: SocketAddr = "192.168.1.5:4000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        let peer: SocketAddr = "192.168.1.5:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");

        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.168.1.5");
        assert_eq!(client_ip(&HeaderMap::new(), None), "");
    }

    #[tokio::test]
    async fn test_handle_panic_hides_payload() {
        let response = handle_panic(Box::new("secret detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 500);
        assert_eq!(json["message"], "internal server error");
        assert!(!String::from_utf8_lossy(&bytes).contains("secret detail"));
    }
}
