// axiom-api/src/lib.rs

//! HTTP/JSON API surface for Axiom.
//!
//! Generalized from the teacher's `rpc` crate: same transport choice
//! (`hyper`, a bounded worker pool in front of the handlers), but routed
//! by REST path and method rather than a JSON-RPC envelope, because
//! that is the surface spec.md §6 actually describes.

pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

pub use server::{ApiConfig, ApiServer};
pub use state::ApiState;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error taxonomy for the API crate, matching spec.md §7's instruction that
/// `axiom-api` error responses carry a `kind` mapped to an HTTP status:
/// `NotFound` -> 404, malformed input -> 400, anything else -> 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::NotImplemented(_) => "NotImplemented",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn status_code(&self) -> hyper::StatusCode {
        match self {
            ApiError::NotFound(_) => hyper::StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => hyper::StatusCode::BAD_REQUEST,
            ApiError::NotImplemented(_) => hyper::StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal(_) => hyper::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axiom_storage::StorageError> for ApiError {
    fn from(e: axiom_storage::StorageError) -> Self {
        match e {
            axiom_storage::StorageError::NotFound(m) => ApiError::NotFound(m),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<axiom_consensus::ConsensusError> for ApiError {
    fn from(e: axiom_consensus::ConsensusError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ApiError::NotFound("x".into()).status_code(), hyper::StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_maps_to_400() {
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), hyper::StatusCode::BAD_REQUEST);
    }
}
