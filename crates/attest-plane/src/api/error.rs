//! API error types and responses
//!
//! Every error leaves the gateway as `{"code": <status>, "description":
//! <reason phrase>}`. The underlying cause is logged here, once, right before
//! the response is written: server errors at `error`, client errors at `info`.
//! Causes are never sent to the caller.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use attest_core::PlacementError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: u16,
    pub description: String,
}

impl ErrorResponse {
    /// Envelope for `status`, described by its canonical reason phrase
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            code: status.as_u16(),
            description: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            info!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse::from_status(status))).into_response()
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(format!("attest place: {}", err))
        } else {
            ApiError::Internal(format!("attest place: {}", err))
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(format!("could not parse request: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::{TokenError, TransportError};

    #[test]
    fn test_envelope_uses_reason_phrase() {
        assert_eq!(
            ErrorResponse::from_status(StatusCode::BAD_REQUEST),
            ErrorResponse {
                code: 400,
                description: "Bad Request".into()
            }
        );
        assert_eq!(
            ErrorResponse::from_status(StatusCode::INTERNAL_SERVER_ERROR).description,
            "Internal Server Error"
        );
    }

    #[test]
    fn test_placement_error_mapping() {
        let err: ApiError = PlacementError::EmptyIdentifier.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = PlacementError::Transform(TransportError::InvalidIdentifier("X".into())).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = PlacementError::Token(TokenError::Signing("bad".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_response_hides_cause() {
        let response = ApiError::Internal("database password is hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
