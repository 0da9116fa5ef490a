//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the tiered cache.
///
/// `InvalidTimeZone` and `Configuration` are raised only while building a
/// cache context. `Transport` is recovered inside reads and surfaced from
/// writes. `Decryption` always propagates.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Timezone name could not be resolved
    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// Fatal configuration problem detected at initialization
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend store could not be reached or rejected the operation
    #[error("Transport error: {0}")]
    Transport(String),

    /// Ciphertext failed integrity checks or was sealed with another key
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Origin data fetch failed
    #[error("Origin error: {0}")]
    Origin(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for errors that must stop the cache from serving traffic.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidTimeZone(_) | CacheError::Configuration(_)
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Internal(format!("serialization failed: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Transport(_) | CacheError::Origin(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidTimeZone(_)
            | CacheError::Configuration(_)
            | CacheError::Decryption(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tiered cache.
pub type Result<T> = std::result::Result<T, CacheError>;
