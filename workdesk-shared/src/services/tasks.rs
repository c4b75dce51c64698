/// Task lifecycle
///
/// Two write paths exist. A full edit replaces every editable field and is
/// reserved for admins and managers. A status-only edit is open to admins and
/// managers on any task and to staff on tasks assigned to them. Reads go
/// through the actor's [`TaskScope`], so a task outside it is reported as
/// `NotFound`.
///
/// Deleting a task removes its attachment rows and blobs in one unit: blobs
/// are staged, rows deleted in a transaction, and the staged blobs purged only
/// after commit. Any failure before commit restores the blobs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::context::AuthContext;
use crate::auth::policy::{authorize, Action};
use crate::auth::scope::TaskScope;
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::attachment::{Attachment, AttachmentListItem};
use crate::models::client::Client;
use crate::models::task::{
    CreateTask, Task, TaskFilter, TaskListItem, TaskPriority, TaskStatus, UpdateTask,
};
use crate::models::user::User;
use crate::storage::BlobStore;

use super::{length_errors, optional, purge_staged, required, restore_staged};

/// Raw task fields as submitted by a caller
///
/// On create, missing `status`/`priority` default to `open`/`medium`. On a
/// full edit they keep the task's current values. Length limits are checked
/// only once the actor is known to be allowed to write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: String,

    pub assigned_to: Option<i64>,
    pub client_id: Option<i64>,

    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
}

/// A task with its attachments
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub attachments: Vec<AttachmentListItem>,
}

struct ValidTask {
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    department: String,
    assigned_to: Option<i64>,
    client_id: Option<i64>,
    due_date: Option<NaiveDate>,
}

pub fn parse_status(value: &str) -> CoreResult<TaskStatus> {
    TaskStatus::parse(value.trim()).ok_or_else(|| {
        CoreError::invalid(
            "status",
            "Status must be one of: open, in_progress, completed, cancelled",
        )
    })
}

fn validate(
    input: TaskInput,
    default_status: TaskStatus,
    default_priority: TaskPriority,
) -> CoreResult<ValidTask> {
    let mut errors = length_errors(&input);

    let title = required(&mut errors, "title", "Title", &input.title);
    let department = required(&mut errors, "department", "Department", &input.department);

    let status = match optional(input.status) {
        None => default_status,
        Some(raw) => TaskStatus::parse(&raw).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "status",
                "Status must be one of: open, in_progress, completed, cancelled",
            ));
            default_status
        }),
    };

    let priority = match optional(input.priority) {
        None => default_priority,
        Some(raw) => TaskPriority::parse(&raw).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "priority",
                "Priority must be one of: low, medium, high, urgent",
            ));
            default_priority
        }),
    };

    let due_date = match optional(input.due_date) {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(FieldError::new("due_date", "Due date must be YYYY-MM-DD"));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(CoreError::ValidationFailed(errors));
    }

    Ok(ValidTask {
        title,
        description: optional(input.description),
        status,
        priority,
        department,
        assigned_to: input.assigned_to,
        client_id: input.client_id,
        due_date,
    })
}

/// Rejects assignee/client ids that do not reference existing rows
///
/// The foreign keys would catch these too; checking first gives the caller
/// a field-level error.
async fn check_references(pool: &SqlitePool, task: &ValidTask) -> CoreResult<()> {
    let mut errors = Vec::new();

    if let Some(user_id) = task.assigned_to {
        if !User::exists(pool, user_id).await? {
            errors.push(FieldError::new("assigned_to", "Assignee does not exist"));
        }
    }
    if let Some(client_id) = task.client_id {
        if !Client::exists(pool, client_id).await? {
            errors.push(FieldError::new("client_id", "Client does not exist"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ValidationFailed(errors))
    }
}

pub async fn create(pool: &SqlitePool, ctx: &AuthContext, input: TaskInput) -> CoreResult<Task> {
    authorize(ctx, Action::CreateTask)?;

    let valid = validate(input, TaskStatus::default(), TaskPriority::default())?;
    check_references(pool, &valid).await?;

    let task = Task::create(
        pool,
        CreateTask {
            title: valid.title,
            description: valid.description,
            status: valid.status,
            priority: valid.priority,
            department: valid.department,
            assigned_to: valid.assigned_to,
            client_id: valid.client_id,
            due_date: valid.due_date,
            created_by: ctx.user_id,
        },
    )
    .await?;

    info!(
        task_id = task.id,
        user_id = ctx.user_id,
        department = %task.department,
        "Task created"
    );
    Ok(task)
}

/// Returns a visible task with its attachments
pub async fn get(pool: &SqlitePool, ctx: &AuthContext, id: i64) -> CoreResult<TaskDetail> {
    let scope = TaskScope::for_actor(ctx);

    let task = Task::find_visible(pool, id, &scope)
        .await?
        .ok_or(CoreError::NotFound("Task"))?;
    let attachments = Attachment::list_by_task(pool, id).await?;

    Ok(TaskDetail { task, attachments })
}

/// Lists visible tasks, newest first
pub async fn list(
    pool: &SqlitePool,
    ctx: &AuthContext,
    filter: &TaskFilter,
) -> CoreResult<Vec<TaskListItem>> {
    let scope = TaskScope::for_actor(ctx);
    Ok(Task::list(pool, &scope, filter).await?)
}

/// Full edit
pub async fn update(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: i64,
    input: TaskInput,
) -> CoreResult<Task> {
    authorize(ctx, Action::EditTask)?;

    let existing = Task::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound("Task"))?;

    let valid = validate(input, existing.status, existing.priority)?;
    check_references(pool, &valid).await?;

    let task = Task::update(
        pool,
        id,
        UpdateTask {
            title: valid.title,
            description: valid.description,
            status: valid.status,
            priority: valid.priority,
            department: valid.department,
            assigned_to: valid.assigned_to,
            client_id: valid.client_id,
            due_date: valid.due_date,
        },
    )
    .await?
    .ok_or(CoreError::NotFound("Task"))?;

    info!(task_id = id, user_id = ctx.user_id, "Task updated");
    Ok(task)
}

/// Status-only edit
///
/// The task is looked up without the scope predicate so a staff member
/// naming someone else's task gets `AuthorizationDenied`, not `NotFound`.
pub async fn update_status(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: i64,
    status: &str,
) -> CoreResult<Task> {
    let existing = Task::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound("Task"))?;

    if let Err(e) = authorize(
        ctx,
        Action::ChangeTaskStatus {
            assignee: existing.assigned_to,
        },
    ) {
        warn!(task_id = id, user_id = ctx.user_id, "Status change denied");
        return Err(e.into());
    }

    let status = parse_status(status)?;

    let task = Task::update_status(pool, id, status)
        .await?
        .ok_or(CoreError::NotFound("Task"))?;

    info!(
        task_id = id,
        user_id = ctx.user_id,
        status = status.as_str(),
        "Task status changed"
    );
    Ok(task)
}

async fn delete_rows(conn: &mut SqliteConnection, id: i64) -> CoreResult<u64> {
    let attachments = Attachment::delete_by_task(&mut *conn, id).await?;
    if !Task::delete(&mut *conn, id).await? {
        return Err(CoreError::NotFound("Task"));
    }
    Ok(attachments)
}

/// Deletes a task, its attachment rows and their blobs
pub async fn delete(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    id: i64,
) -> CoreResult<()> {
    authorize(ctx, Action::DeleteTask)?;

    let mut tx = pool.begin().await?;

    if Task::find_by_id(&mut *tx, id).await?.is_none() {
        return Err(CoreError::NotFound("Task"));
    }
    let names = Attachment::stored_names_for_task(&mut *tx, id).await?;

    let mut staged = Vec::with_capacity(names.len());
    for name in &names {
        match store.stage_removal(name).await {
            Ok(Some(blob)) => staged.push(blob),
            Ok(None) => warn!(task_id = id, blob = %name, "Attachment blob already missing"),
            Err(e) => {
                restore_staged(store, &staged).await;
                tx.rollback().await?;
                tracing::error!(task_id = id, error = %e, "Failed to stage attachment blob");
                return Err(CoreError::StorageFailure(e.to_string()));
            }
        }
    }

    let attachments = match delete_rows(&mut tx, id).await {
        Ok(count) => count,
        Err(e) => {
            restore_staged(store, &staged).await;
            return Err(e);
        }
    };

    if let Err(e) = tx.commit().await {
        restore_staged(store, &staged).await;
        return Err(e.into());
    }

    purge_staged(store, &staged).await;

    info!(
        task_id = id,
        user_id = ctx.user_id,
        attachments,
        "Task deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TaskInput {
        TaskInput {
            title: "Prepare Q3 accounts".to_string(),
            department: "Finance".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let valid = validate(input(), TaskStatus::Open, TaskPriority::Medium).unwrap();
        assert_eq!(valid.status, TaskStatus::Open);
        assert_eq!(valid.priority, TaskPriority::Medium);
        assert_eq!(valid.description, None);
    }

    #[test]
    fn test_blank_required_fields_reported_together() {
        let bad = TaskInput {
            title: "  ".to_string(),
            department: String::new(),
            status: Some("done".to_string()),
            priority: Some("critical".to_string()),
            due_date: Some("31/12/2025".to_string()),
            ..Default::default()
        };

        let Err(CoreError::ValidationFailed(errors)) =
            validate(bad, TaskStatus::Open, TaskPriority::Medium)
        else {
            panic!("expected validation failure");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "department", "status", "priority", "due_date"]);
    }

    #[test]
    fn test_length_limits() {
        let long = TaskInput {
            title: "x".repeat(201),
            department: "d".repeat(101),
            ..input()
        };
        let Err(CoreError::ValidationFailed(errors)) =
            validate(long, TaskStatus::Open, TaskPriority::Medium)
        else {
            panic!("expected validation failure");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["department", "title"]);
    }

    #[test]
    fn test_edit_keeps_existing_when_unset() {
        let valid = validate(input(), TaskStatus::Completed, TaskPriority::Urgent).unwrap();
        assert_eq!(valid.status, TaskStatus::Completed);
        assert_eq!(valid.priority, TaskPriority::Urgent);
    }

    #[test]
    fn test_due_date_parsed() {
        let with_date = TaskInput {
            due_date: Some("2025-12-31".to_string()),
            ..input()
        };
        let valid = validate(with_date, TaskStatus::Open, TaskPriority::Medium).unwrap();
        assert_eq!(valid.due_date, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(" in_progress ").unwrap(), TaskStatus::InProgress);
        assert!(matches!(parse_status("archived"), Err(CoreError::ValidationFailed(_))));
    }
}
