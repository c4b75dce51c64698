/// Task model and database operations
///
/// Tasks are units of work owned by a department and optionally assigned to a
/// user and linked to a client. Any status may follow any other; who may make
/// the change is decided by the permission policy, not here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL CHECK (status IN ('open', 'in_progress', 'completed', 'cancelled')),
///     priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
///     department TEXT NOT NULL,
///     assigned_to INTEGER REFERENCES users(id),
///     client_id INTEGER REFERENCES clients(id),
///     due_date TEXT,
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     created_at TIMESTAMP NOT NULL,
///     updated_at TIMESTAMP NOT NULL
/// );
/// ```
///
/// List queries take a [`TaskScope`] and push it into the `WHERE` clause, so
/// callers cannot forget to narrow them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::auth::scope::TaskScope;

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.priority, t.department, \
     t.assigned_to, t.client_id, t.due_date, t.created_by, t.created_at, t.updated_at";

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Completed and cancelled tasks no longer count as outstanding work
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Task priority, most urgent last in declaration order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Display order: urgent first
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Urgent,
        TaskPriority::High,
        TaskPriority::Medium,
        TaskPriority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Owning department; drives manager visibility
    pub department: String,

    /// Assignee; drives staff visibility
    pub assigned_to: Option<i64>,

    pub client_id: Option<i64>,
    pub due_date: Option<NaiveDate>,

    /// Creator, fixed at insert
    pub created_by: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task row joined with display names for lists
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    pub assignee_name: Option<String>,
    pub client_name: Option<String>,
}

/// Validated input for inserting a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub department: String,
    pub assigned_to: Option<i64>,
    pub client_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub created_by: i64,
}

/// Validated replacement values for a full edit
///
/// The creator is not part of this struct and can never change.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub department: String,
    pub assigned_to: Option<i64>,
    pub client_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

/// Optional narrowing applied on top of the scope predicate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub department: Option<String>,

    /// Substring matched against title or description
    pub search: Option<String>,
}

impl Task {
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, department,
                               assigned_to, client_id, due_date, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, description, status, priority, department,
                      assigned_to, client_id, due_date, created_by, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.department)
        .bind(data.assigned_to)
        .bind(data.client_id)
        .bind(data.due_date)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    /// Finds a task by ID without any visibility check
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, department,
                   assigned_to, client_id, due_date, created_by, created_at, updated_at
            FROM tasks
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a task by ID only if it falls inside the scope
    pub async fn find_visible<'e, E>(
        executor: E,
        id: i64,
        scope: &TaskScope,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(TASK_COLUMNS);
        qb.push(" FROM tasks t WHERE t.id = ");
        qb.push_bind(id);
        scope.push_predicate(&mut qb, "t");

        qb.build_query_as::<Task>().fetch_optional(executor).await
    }

    /// Lists visible tasks, newest first, with assignee and client names
    pub async fn list<'e, E>(
        executor: E,
        scope: &TaskScope,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskListItem>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(TASK_COLUMNS);
        qb.push(
            ", u.full_name AS assignee_name, c.company_name AS client_name \
             FROM tasks t \
             LEFT JOIN users u ON t.assigned_to = u.id \
             LEFT JOIN clients c ON t.client_id = c.id \
             WHERE 1=1",
        );
        scope.push_predicate(&mut qb, "t");

        if let Some(status) = filter.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(department) = filter.department.as_deref().map(str::trim) {
            if !department.is_empty() {
                qb.push(" AND t.department = ").push_bind(department.to_string());
            }
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = format!("%{}%", search);
                qb.push(" AND (t.title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR t.description LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        qb.push(" ORDER BY t.created_at DESC, t.id DESC");

        qb.build_query_as::<TaskListItem>().fetch_all(executor).await
    }

    /// Replaces every editable field
    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, status = ?, priority = ?, department = ?,
                assigned_to = ?, client_id = ?, due_date = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, title, description, status, priority, department,
                      assigned_to, client_id, due_date, created_by, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.department)
        .bind(data.assigned_to)
        .bind(data.client_id)
        .bind(data.due_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_status<'e, E>(
        executor: E,
        id: i64,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, title, description, status, priority, department,
                      assigned_to, client_id, due_date, created_by, created_at, updated_at
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a task row, returning whether it existed
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of tasks referencing a client, regardless of scope
    pub async fn count_by_client<'e, E>(executor: E, client_id: i64) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE client_id = ?")
            .bind(client_id)
            .fetch_one(executor)
            .await
    }
}
