//! Error types for the service
//!
//! Provides unified error handling using thiserror. Handler errors are
//! recorded on the response and turned into the uniform JSON envelope by
//! the error-translation middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Api Error Enum ==
/// Errors returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A dependency failed while handling the request
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// A handler error that has been recorded but not yet written.
///
/// Stored in the response extensions; the response body is empty until
/// the error-translation middleware fills it in.
#[derive(Debug, Clone)]
pub struct RecordedError(pub Arc<str>);

impl RecordedError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let recorded = RecordedError(Arc::from(self.to_string()));
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(recorded);
        response
    }
}

// == Cache Error Enum ==
/// Errors from the cache client.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("invalid cache connection settings: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("cache command failed: {0}")]
    Command(#[source] redis::RedisError),

    #[error("failed to close cache connection: {0}")]
    Close(#[source] redis::RedisError),
}

// == Server Error Enum ==
/// Errors from the HTTP listener lifecycle.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(String),

    #[error("in-flight requests did not drain within {0:?}")]
    DrainTimeout(Duration),
}

// == Result Type Alias ==
/// Convenience Result type for request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_records_message() {
        let response = ApiError::Internal("boom".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let recorded = response.extensions().get::<RecordedError>().unwrap();
        assert_eq!(recorded.message(), "internal error: boom");
    }

    #[test]
    fn test_drain_timeout_message() {
        let err = ServerError::DrainTimeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "in-flight requests did not drain within 10s");
    }
}
