/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to a JSON error
/// body with the matching status code. Core errors map one-to-one:
///
/// | Core error | Status |
/// |---|---|
/// | `ValidationFailed` | 422 |
/// | `AuthenticationFailed` | 401 |
/// | `AuthorizationDenied` | 403 |
/// | `NotFound` | 404 |
/// | `Conflict` | 409 |
/// | `StorageFailure`, `Internal` | 500 |
///
/// # Example
///
/// ```
/// use workdesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<&'static str>> {
///     Err(ApiError::NotFound("Task not found".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use workdesk_shared::{CoreError, FieldError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), malformed transport input
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden,

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<FieldError>),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g. "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "You do not have permission to perform this action".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert core errors to API errors
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed(errors) => ApiError::ValidationError(errors),
            CoreError::AuthorizationDenied => ApiError::Forbidden,
            CoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::AuthenticationFailed => {
                ApiError::Unauthorized("Invalid username or password".to_string())
            }
            CoreError::StorageFailure(msg) => {
                ApiError::InternalError(format!("Storage failure: {}", msg))
            }
            CoreError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_core_error_status_codes() {
        let cases = [
            (CoreError::invalid("title", "Title is required"), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::AuthorizationDenied, StatusCode::FORBIDDEN),
            (CoreError::NotFound("Task"), StatusCode::NOT_FOUND),
            (CoreError::Conflict("linked".to_string()), StatusCode::CONFLICT),
            (CoreError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (CoreError::StorageFailure("disk".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (CoreError::Internal("db".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (core, expected) in cases {
            let response = ApiError::from(core).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_error_keeps_fields() {
        let err: ApiError = CoreError::ValidationFailed(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("department", "Department is required"),
        ])
        .into();

        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }
}
