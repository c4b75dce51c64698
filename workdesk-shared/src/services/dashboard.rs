/// Role-aware dashboard
///
/// Every task figure is computed with the actor's [`TaskScope`] in the
/// `WHERE` clause, the same predicate the task list uses, so the dashboard
/// never disagrees with the list for the same actor. Organisation figures
/// (clients, staff, departments, workload) are added per role:
///
/// | Section | admin | manager | staff |
/// |---|---|---|---|
/// | task counts, by status, by priority | all tasks | own department | own tasks |
/// | client totals | yes | yes | no |
/// | staff total, by department | yes | no | no |
/// | workload by user | all users | own department | no |

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::auth::context::AuthContext;
use crate::auth::scope::TaskScope;
use crate::error::CoreResult;
use crate::models::client::Client;
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TaskCounts {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,

    /// Due before today and neither completed nor cancelled
    pub overdue: i64,

    /// Urgent and neither completed nor cancelled
    pub urgent: i64,
}

/// One labelled count in a breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Bucket {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Workload {
    pub user_id: i64,
    pub full_name: String,

    /// Assigned tasks that are not completed
    pub task_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganisationMetrics {
    pub total_clients: i64,
    pub active_clients: i64,

    /// Admin only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_staff: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub role: Role,
    pub counts: TaskCounts,
    pub by_status: Vec<Bucket>,

    /// Ordered urgent, high, medium, low
    pub by_priority: Vec<Bucket>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<OrganisationMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_department: Option<Vec<Bucket>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<Vec<Workload>>,
}

/// Builds the dashboard for the actor
pub async fn summary(pool: &SqlitePool, ctx: &AuthContext) -> CoreResult<DashboardSummary> {
    let scope = TaskScope::for_actor(ctx);
    let today = Utc::now().date_naive();

    let counts = task_counts(pool, &scope, today).await?;
    let by_status = breakdown(pool, &scope, "t.status", "t.status").await?;
    let by_priority = breakdown(
        pool,
        &scope,
        "t.priority",
        "CASE t.priority WHEN 'urgent' THEN 1 WHEN 'high' THEN 2 WHEN 'medium' THEN 3 ELSE 4 END",
    )
    .await?;

    let mut summary = DashboardSummary {
        role: ctx.role,
        counts,
        by_status,
        by_priority,
        organisation: None,
        by_department: None,
        workload: None,
    };

    if ctx.is_privileged() {
        let (total_clients, active_clients) = Client::counts(pool).await?;
        let total_staff = match ctx.role {
            Role::Admin => Some(User::count(pool).await?),
            _ => None,
        };
        summary.organisation = Some(OrganisationMetrics {
            total_clients,
            active_clients,
            total_staff,
        });

        let department = (ctx.role == Role::Manager).then_some(ctx.department.as_str());
        summary.workload = Some(workload(pool, &scope, department).await?);
    }
    if ctx.role == Role::Admin {
        summary.by_department =
            Some(breakdown(pool, &scope, "t.department", "t.department").await?);
    }

    tracing::debug!(user_id = ctx.user_id, total = summary.counts.total, "Dashboard built");
    Ok(summary)
}

async fn task_counts(
    pool: &SqlitePool,
    scope: &TaskScope,
    today: NaiveDate,
) -> CoreResult<TaskCounts> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN t.status = 'open' THEN 1 ELSE 0 END), 0) AS open, \
         COALESCE(SUM(CASE WHEN t.status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress, \
         COALESCE(SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END), 0) AS completed, \
         COALESCE(SUM(CASE WHEN t.due_date IS NOT NULL AND t.due_date < ",
    );
    qb.push_bind(today);
    qb.push(
        " AND t.status NOT IN ('completed', 'cancelled') THEN 1 ELSE 0 END), 0) AS overdue, \
         COALESCE(SUM(CASE WHEN t.priority = 'urgent' \
             AND t.status NOT IN ('completed', 'cancelled') THEN 1 ELSE 0 END), 0) AS urgent \
         FROM tasks t WHERE 1=1",
    );
    scope.push_predicate(&mut qb, "t");

    Ok(qb.build_query_as::<TaskCounts>().fetch_one(pool).await?)
}

/// Counts visible tasks grouped by one column
async fn breakdown(
    pool: &SqlitePool,
    scope: &TaskScope,
    column: &'static str,
    order_by: &'static str,
) -> CoreResult<Vec<Bucket>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    qb.push(column);
    qb.push(" AS label, COUNT(*) AS count FROM tasks t WHERE 1=1");
    scope.push_predicate(&mut qb, "t");
    qb.push(" GROUP BY ");
    qb.push(column);
    qb.push(" ORDER BY ");
    qb.push(order_by);

    Ok(qb.build_query_as::<Bucket>().fetch_all(pool).await?)
}

/// Open work per assignee, busiest first
async fn workload(
    pool: &SqlitePool,
    scope: &TaskScope,
    department: Option<&str>,
) -> CoreResult<Vec<Workload>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT u.id AS user_id, u.full_name, COUNT(t.id) AS task_count \
         FROM users u \
         JOIN tasks t ON t.assigned_to = u.id AND t.status != 'completed' \
         WHERE 1=1",
    );
    scope.push_predicate(&mut qb, "t");
    if let Some(department) = department {
        qb.push(" AND u.department = ").push_bind(department.to_string());
    }
    qb.push(" GROUP BY u.id, u.full_name ORDER BY task_count DESC, u.full_name ASC");

    Ok(qb.build_query_as::<Workload>().fetch_all(pool).await?)
}
