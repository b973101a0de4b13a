//! Response models for the service API
//!
//! DTOs used for serializing HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{ErrorResponse, HealthResponse, SuccessResponse};
