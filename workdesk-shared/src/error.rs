/// Core error taxonomy
///
/// Every service entry point returns [`CoreResult`]. The presentation layer
/// maps each variant onto exactly one response status:
///
/// | Variant | Meaning |
/// |---|---|
/// | `ValidationFailed` | malformed or missing input, the caller must resubmit |
/// | `AuthorizationDenied` | actor lacks rights; the rule that fired is never revealed |
/// | `NotFound` | referenced row absent (or outside the actor's scope) |
/// | `Conflict` | linked rows block the operation, or a unique value is taken |
/// | `StorageFailure` | blob write/remove failed; metadata was left consistent |
/// | `AuthenticationFailed` | unknown handle, wrong secret, or dead session |
/// | `Internal` | infrastructure fault, details are logged and not shown |

use serde::{Deserialize, Serialize};

use crate::auth::policy::AuthzError;
use crate::auth::password::PasswordError;
use crate::storage::StorageError;

/// Result alias used by the service layer
pub type CoreResult<T> = Result<T, CoreError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type shared by every core operation
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input was malformed or incomplete
    #[error("Validation failed: {} error(s)", .0.len())]
    ValidationFailed(Vec<FieldError>),

    /// Actor is not allowed to perform the action
    #[error("Access denied")]
    AuthorizationDenied,

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation blocked by existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// File storage failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Credentials or session were not accepted
    #[error("Invalid username or password")]
    AuthenticationFailed,

    /// Unexpected infrastructure error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::ValidationFailed(vec![FieldError::new(field, message)])
    }
}

/// Translate storage-layer errors so raw database errors never leak upwards
///
/// Unique violations become `Conflict`, foreign key and check violations
/// become `ValidationFailed`; anything else is `Internal`.
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("Record"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if db_err.is_unique_violation() {
                    return CoreError::Conflict(unique_violation_message(&message));
                }
                if db_err.is_foreign_key_violation() {
                    return CoreError::invalid("reference", "Referenced record does not exist");
                }
                if db_err.is_check_violation() {
                    return CoreError::invalid("value", "Value is not one of the allowed options");
                }
                tracing::error!(error = %message, "Unhandled database error");
                CoreError::Internal(format!("Database error: {}", message))
            }
            other => {
                tracing::error!(error = %other, "Database error");
                CoreError::Internal(format!("Database error: {}", other))
            }
        }
    }
}

fn unique_violation_message(message: &str) -> String {
    if message.contains("users.username") {
        "Username already exists".to_string()
    } else if message.contains("attachments.filename") {
        "Stored filename already in use".to_string()
    } else {
        "Record already exists".to_string()
    }
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        tracing::debug!(reason = %err, "Authorization denied");
        CoreError::AuthorizationDenied
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(_) => CoreError::NotFound("File"),
            StorageError::NotFound(_) => CoreError::NotFound("File"),
            other => {
                tracing::error!(error = %other, "Blob storage error");
                CoreError::StorageFailure(other.to_string())
            }
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::ValidationFailed(field_errors(&errors))
    }
}

/// Flattens `validator` output into field errors, sorted by field name
pub(crate) fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                FieldError::new(
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                )
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotFound("Task");
        assert_eq!(err.to_string(), "Task not found");

        let err = CoreError::invalid("title", "Title is required");
        assert_eq!(err.to_string(), "Validation failed: 1 error(s)");

        assert_eq!(
            CoreError::AuthenticationFailed.to_string(),
            "Invalid username or password"
        );
    }

    #[test]
    fn test_authz_error_never_reveals_rule() {
        let err: CoreError = AuthzError::NotAssignee.into();
        assert!(matches!(err, CoreError::AuthorizationDenied));
        assert_eq!(err.to_string(), "Access denied");
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: CoreError = StorageError::InvalidName("../etc/passwd".to_string()).into();
        assert!(matches!(err, CoreError::NotFound("File")));

        let err: CoreError =
            StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into();
        assert!(matches!(err, CoreError::StorageFailure(_)));
    }

    #[test]
    fn test_unique_violation_message() {
        assert_eq!(
            unique_violation_message("UNIQUE constraint failed: users.username"),
            "Username already exists"
        );
        assert_eq!(unique_violation_message("something else"), "Record already exists");
    }
}
