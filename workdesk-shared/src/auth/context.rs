/// Authenticated actor context
///
/// An `AuthContext` is produced by a successful login (or by resolving a live
/// session) and handed explicitly to every core operation. Nothing in the core
/// reads ambient session state; the policy and scope checks are pure functions
/// of this value.
///
/// # Example
///
/// ```
/// use workdesk_shared::auth::context::AuthContext;
/// use workdesk_shared::models::user::Role;
///
/// let ctx = AuthContext::new(7, "j.doe", Role::Staff, "Finance");
/// assert!(!ctx.is_privileged());
/// ```

use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};

/// Identity, role and department of the actor performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Login handle, for log lines only
    pub username: String,

    /// Role at the time the session was established
    pub role: Role,

    /// Department at the time the session was established
    pub department: String,
}

impl AuthContext {
    pub fn new(
        user_id: i64,
        username: impl Into<String>,
        role: Role,
        department: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
            department: department.into(),
        }
    }

    /// Builds the context for a freshly authenticated user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            department: user.department.clone(),
        }
    }

    /// Admins and managers administer tasks and clients
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}
