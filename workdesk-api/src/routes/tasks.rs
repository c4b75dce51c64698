/// Task endpoints
///
/// # Endpoints
///
/// - `GET /tasks` - Tasks visible to the caller, with optional filters
/// - `POST /tasks` - Create a task (admin, manager)
/// - `GET /tasks/:id` - One visible task with its attachments
/// - `PUT /tasks/:id` - Full edit (admin, manager)
/// - `DELETE /tasks/:id` - Delete a task and its files (admin, manager)
/// - `POST /tasks/:id/status` - Status-only edit (also the assignee)
///
/// Write bodies deserialize straight into [`TaskInput`]; the core checks the
/// caller's rights before any field is validated.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use workdesk_shared::{
    auth::context::AuthContext,
    models::task::{Task, TaskFilter, TaskListItem, TaskPriority},
    services::tasks::{self, TaskDetail, TaskInput},
    CoreError,
};

/// Query string accepted by `GET /tasks`
///
/// Empty values are ignored so a form can submit every field.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TaskListQuery {
    fn into_filter(self) -> Result<TaskFilter, CoreError> {
        let status = non_empty(self.status)
            .map(|raw| tasks::parse_status(&raw))
            .transpose()?;

        let priority = non_empty(self.priority)
            .map(|raw| {
                TaskPriority::parse(&raw).ok_or_else(|| {
                    CoreError::invalid("priority", "Priority must be one of: low, medium, high, urgent")
                })
            })
            .transpose()?;

        Ok(TaskFilter {
            status,
            priority,
            department: non_empty(self.department),
            search: non_empty(self.search),
        })
    }
}

/// Body of `POST /tasks/:id/status`
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskListItem>>> {
    let filter = query.into_filter()?;
    let items = tasks::list(&state.db, &ctx, &filter).await?;
    Ok(Json(items))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<TaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create(&state.db, &ctx, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(tasks::get(&state.db, &ctx, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::update(&state.db, &ctx, id, input).await?))
}

/// Status-only edit
///
/// Staff may use this on tasks assigned to them; admins and managers on any.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::update_status(&state.db, &ctx, id, &req.status).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    tasks::delete(&state.db, state.store.as_ref(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use workdesk_shared::models::task::TaskStatus;

    #[test]
    fn test_query_ignores_blank_values() {
        let filter = TaskListQuery {
            status: Some("".to_string()),
            priority: Some("  ".to_string()),
            department: Some("Finance".to_string()),
            search: None,
        }
        .into_filter()
        .unwrap();

        assert_eq!(
            filter,
            TaskFilter {
                department: Some("Finance".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_query_parses_enums() {
        let filter = TaskListQuery {
            status: Some("in_progress".to_string()),
            priority: Some("urgent".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.status, Some(TaskStatus::InProgress));
        assert_eq!(filter.priority, Some(TaskPriority::Urgent));
    }

    #[test]
    fn test_query_rejects_unknown_priority() {
        let result = TaskListQuery {
            priority: Some("whenever".to_string()),
            ..Default::default()
        }
        .into_filter();

        assert!(matches!(result, Err(CoreError::ValidationFailed(_))));
    }
}
