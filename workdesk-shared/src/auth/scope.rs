/// Row-visibility scope for task queries
///
/// A [`TaskScope`] is derived once from an [`AuthContext`] and pushed into the
/// `WHERE` clause of every task list and aggregate query, so rows outside the
/// actor's scope are never read from the store:
///
/// | Role | Visible tasks |
/// |---|---|
/// | admin | all |
/// | manager | `department = actor.department` |
/// | staff | `assigned_to = actor.user_id` |
///
/// Detail lists and dashboard counts share the same predicate, so for a given
/// actor they always agree.
///
/// # Example
///
/// ```
/// use sqlx::{QueryBuilder, Sqlite};
/// use workdesk_shared::auth::{context::AuthContext, scope::TaskScope};
/// use workdesk_shared::models::user::Role;
///
/// let ctx = AuthContext::new(4, "k.patel", Role::Staff, "Finance");
/// let scope = TaskScope::for_actor(&ctx);
///
/// let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t WHERE 1=1");
/// scope.push_predicate(&mut qb, "t");
/// assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tasks t WHERE 1=1 AND t.assigned_to = ?");
/// ```

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use super::context::AuthContext;
use crate::models::user::Role;

/// Which task rows an actor may read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaskScope {
    /// Every task
    Unrestricted,

    /// Tasks whose department equals the given one
    Department(String),

    /// Tasks assigned to the given user
    AssignedTo(i64),
}

impl TaskScope {
    /// Derives the scope for an actor
    pub fn for_actor(ctx: &AuthContext) -> Self {
        match ctx.role {
            Role::Admin => TaskScope::Unrestricted,
            Role::Manager => TaskScope::Department(ctx.department.clone()),
            Role::Staff => TaskScope::AssignedTo(ctx.user_id),
        }
    }

    /// Appends the predicate as an `AND` clause on the given table alias
    ///
    /// The builder must already contain a `WHERE` clause.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>, alias: &str) {
        match self {
            TaskScope::Unrestricted => {}
            TaskScope::Department(department) => {
                qb.push(format!(" AND {}.department = ", alias));
                qb.push_bind(department.clone());
            }
            TaskScope::AssignedTo(user_id) => {
                qb.push(format!(" AND {}.assigned_to = ", alias));
                qb.push_bind(*user_id);
            }
        }
    }
}
