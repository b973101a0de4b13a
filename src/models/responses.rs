//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for the health probes (GET /api/health*)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Probe status (`healthy`, `ready` or `alive`)
    pub status: &'static str,
    /// Current Unix timestamp in seconds
    pub time: i64,
}

impl HealthResponse {
    /// Creates a new HealthResponse stamped with the current time
    pub fn new(status: &'static str) -> Self {
        Self {
            status,
            time: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new("healthy")
    }

    pub fn ready() -> Self {
        Self::new("ready")
    }

    pub fn alive() -> Self {
        Self::new("alive")
    }
}

/// Uniform error envelope for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub code: u16,
    /// Human-readable summary
    pub message: String,
    /// Text of the underlying error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(code: u16, message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            error,
        }
    }
}

/// Success envelope wrapping an arbitrary payload
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub code: u16,
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            code: 200,
            message: "success",
            data,
        }
    }
}
