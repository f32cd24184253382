//! HTTP error responses.
//!
//! Every failure leaves the server as an [`ApiErrorResponse`]: a status code
//! plus an [`ErrorBody`] rendered as JSON. Validation failures are 400 and
//! name the first offending field in the message; missing records are 404.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tasksync_proto::task::{ErrorBody, FieldError};

use crate::store::StoreError;

/// Error code for field-level validation failures.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Error code for unparseable request bodies or query strings.
pub const BAD_REQUEST: &str = "BAD_REQUEST";
/// Error code for unknown record ids.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Field-level validation failure collected while checking a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending fields, in the order they were checked.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a validation error for a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }
}

/// Status code and body of a failed request.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// JSON body.
    pub body: ErrorBody,
}

impl ApiErrorResponse {
    /// Creates a 400 response with a free-form message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                code: BAD_REQUEST.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Creates a 404 response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                code: NOT_FOUND.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        let message = error.errors.first().map_or_else(
            || "validation failed".to_string(),
            |first| format!("{}: {}", first.field, first.message),
        );
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                code: VALIDATION_ERROR.to_string(),
                message,
                details: Some(error.errors),
            },
        }
    }
}

impl From<StoreError> for ApiErrorResponse {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::not_found(error.to_string()),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
