/// Core operations
///
/// Every entry point takes the actor's [`AuthContext`](crate::auth::context::AuthContext)
/// explicitly, asks the permission policy first, and only then touches the
/// store. Errors are always [`CoreError`](crate::error::CoreError).
///
/// - [`tasks`]: task lifecycle and scoped task queries
/// - [`clients`]: client CRUD with the linked-task delete guard
/// - [`attachments`]: upload, download and two-phase delete of task files
/// - [`dashboard`]: scoped counts and breakdowns
/// - [`users`]: provisioning and the assignee picker

pub mod attachments;
pub mod clients;
pub mod dashboard;
pub mod tasks;
pub mod users;

use validator::Validate;

use crate::error::{field_errors, FieldError};
use crate::storage::{BlobStore, StagedBlob};

/// Length limits declared on an input type; empty when all are met
pub(crate) fn length_errors(input: &impl Validate) -> Vec<FieldError> {
    match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_errors(&errors),
    }
}

/// Trims a required text field, recording an error if nothing is left
pub(crate) fn required(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
    }
    trimmed.to_string()
}

/// Trims an optional text field; blank becomes `None`
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Puts staged blobs back after a failed transaction
pub(crate) async fn restore_staged(store: &dyn BlobStore, staged: &[StagedBlob]) {
    for blob in staged {
        if let Err(e) = store.restore(blob).await {
            tracing::error!(blob = %blob.name, error = %e, "Failed to restore staged blob");
        }
    }
}

/// Permanently removes staged blobs once their rows are gone
///
/// The rows are already committed at this point, so failures only leave an
/// orphan in the trash directory and are logged.
pub(crate) async fn purge_staged(store: &dyn BlobStore, staged: &[StagedBlob]) {
    for blob in staged {
        if let Err(e) = store.purge(blob).await {
            tracing::warn!(blob = %blob.name, error = %e, "Failed to purge staged blob");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        let mut errors = Vec::new();
        assert_eq!(required(&mut errors, "title", "Title", "  Q3 report "), "Q3 report");
        assert!(errors.is_empty());

        required(&mut errors, "title", "Title", "   ");
        assert_eq!(errors, vec![FieldError::new("title", "Title is required")]);
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(Some("  ".to_string())), None);
        assert_eq!(optional(None), None);
        assert_eq!(optional(Some(" x ".to_string())), Some("x".to_string()));
    }
}
