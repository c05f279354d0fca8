//! Store error types with HTTP status code mapping.
//!
//! [`StoreError`] is the central error type for the crate. Validation
//! variants are raised before any store access; database failures are
//! carried through unchanged. The API layer that consumes this crate can
//! return a [`StoreError`] straight from a handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid coordinate swLat: 91"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Crate-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A latitude or longitude was non-finite or out of range.
    #[error("invalid coordinate {field}: {value}")]
    InvalidCoordinate {
        /// Parameter name as the client sent it (e.g. `swLat`).
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A POSIX millisecond timestamp outside the representable range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Request parameters are inconsistent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failure reported by the database driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidCoordinate { .. } => 1001,
            Self::InvalidTimestamp(_) => 1002,
            Self::InvalidRequest(_) => 1003,
            Self::Internal(_) => 3000,
            Self::Database(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCoordinate { .. } | Self::InvalidTimestamp(_) | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for errors raised before touching the store.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinate { .. } | Self::InvalidTimestamp(_) | Self::InvalidRequest(_)
        )
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "map data query failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = StoreError::InvalidCoordinate {
            field: "swLat",
            value: 91.0,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid coordinate swLat: 91");
    }

    #[test]
    fn database_errors_map_to_server_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), 3001);
        assert!(!err.is_validation());
    }

    #[test]
    fn internal_errors_map_to_server_error() {
        let err = StoreError::Internal("subscriber already set".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), 3000);
        assert!(!err.is_validation());
    }

    #[test]
    fn into_response_carries_status() {
        let response = StoreError::InvalidTimestamp(i64::MAX).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
