//! Response helpers
//!
//! Shortcuts for writing the uniform JSON envelopes from handlers.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::models::{ErrorResponse, SuccessResponse};

/// Writes the error envelope and logs it.
///
/// Logged at error level when an underlying error is given, warn otherwise.
pub fn respond_error(status: StatusCode, message: &str, err: Option<&dyn Display>) -> Response {
    let detail = err.map(|e| e.to_string());
    match &detail {
        Some(detail) => error!(status = status.as_u16(), error = %detail, "{message}"),
        None => warn!(status = status.as_u16(), "{message}"),
    }

    let body = ErrorResponse::new(status.as_u16(), message, detail);
    (status, Json(body)).into_response()
}

/// 400 with the error envelope.
pub fn respond_bad_request(message: &str, err: Option<&dyn Display>) -> Response {
    respond_error(StatusCode::BAD_REQUEST, message, err)
}

/// 500 with the error envelope.
pub fn respond_internal_error(message: &str, err: Option<&dyn Display>) -> Response {
    respond_error(StatusCode::INTERNAL_SERVER_ERROR, message, err)
}

/// 200 with `{"code":200,"message":"success","data":...}`.
pub fn respond_success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(SuccessResponse::new(data))).into_response()
}
