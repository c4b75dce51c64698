/// Permission policy
///
/// [`authorize`] is a pure decision over an [`AuthContext`] and an [`Action`].
/// Actions that depend on a specific row carry the facts the rule needs
/// (the task's assignee, the attachment's uploader), so the caller loads the
/// row, then asks. Every service entry point calls `authorize` before doing
/// any work that has side effects.
///
/// | Action | admin | manager | staff |
/// |---|---|---|---|
/// | list/view/create/edit client | yes | yes | no |
/// | delete client | yes | no | no |
/// | create/edit/delete task | yes | yes | no |
/// | change task status | yes | yes | assignee only |
/// | upload attachment | yes | yes | yes (visible tasks) |
/// | delete attachment | yes | yes | uploader only |
/// | list users | yes | yes | no |
///
/// Read access to tasks is not an action; it is governed by
/// [`TaskScope`](super::scope::TaskScope).

use super::context::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
///
/// The variants exist for logging. They all collapse into the same
/// `AuthorizationDenied` outcome once they leave the core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Role may never perform this action
    #[error("Role {role:?} may not {action}")]
    InsufficientRole { action: &'static str, role: Role },

    /// Staff status change on a task assigned to someone else
    #[error("Task is not assigned to the actor")]
    NotAssignee,

    /// Staff deleting someone else's attachment
    #[error("Attachment was uploaded by another user")]
    NotUploader,
}

/// Operations subject to the permission table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListClients,
    ViewClient,
    CreateClient,
    EditClient,
    DeleteClient,
    CreateTask,
    EditTask,
    DeleteTask,
    /// Status-only edit; carries the task's current assignee
    ChangeTaskStatus { assignee: Option<i64> },
    UploadAttachment,
    /// Carries the attachment's uploader
    DeleteAttachment { uploader: i64 },
    ListUsers,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ListClients => "list clients",
            Action::ViewClient => "view client",
            Action::CreateClient => "create client",
            Action::EditClient => "edit client",
            Action::DeleteClient => "delete client",
            Action::CreateTask => "create task",
            Action::EditTask => "edit task",
            Action::DeleteTask => "delete task",
            Action::ChangeTaskStatus { .. } => "change task status",
            Action::UploadAttachment => "upload attachment",
            Action::DeleteAttachment { .. } => "delete attachment",
            Action::ListUsers => "list users",
        }
    }
}

/// Decides whether the actor may perform the action
pub fn authorize(ctx: &AuthContext, action: Action) -> Result<(), AuthzError> {
    let denied = || AuthzError::InsufficientRole {
        action: action.name(),
        role: ctx.role,
    };

    match (ctx.role, action) {
        (Role::Admin, _) => Ok(()),

        (Role::Manager, Action::DeleteClient) => Err(denied()),
        (Role::Manager, _) => Ok(()),

        (Role::Staff, Action::UploadAttachment) => Ok(()),
        (Role::Staff, Action::ChangeTaskStatus { assignee }) => {
            if assignee == Some(ctx.user_id) {
                Ok(())
            } else {
                Err(AuthzError::NotAssignee)
            }
        }
        (Role::Staff, Action::DeleteAttachment { uploader }) => {
            if uploader == ctx.user_id {
                Ok(())
            } else {
                Err(AuthzError::NotUploader)
            }
        }
        (Role::Staff, _) => Err(denied()),
    }
}
