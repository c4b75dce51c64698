/// Attachment model and database operations
///
/// An attachment row records a blob stored under a system-generated name
/// (`filename`, unique and never reused) together with the name the uploader
/// supplied (`original_filename`, for display only). Rows are removed with
/// their task by `ON DELETE CASCADE`; the blobs are removed by the service
/// layer.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     filename TEXT NOT NULL UNIQUE,
///     original_filename TEXT NOT NULL,
///     file_size INTEGER NOT NULL,
///     uploaded_by INTEGER NOT NULL REFERENCES users(id),
///     uploaded_at TIMESTAMP NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,

    /// Stored name inside the blob store
    pub filename: String,

    /// Name supplied at upload, final path component only
    pub original_filename: String,

    pub file_size: i64,
    pub uploaded_by: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment row joined with the uploader's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttachmentListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attachment: Attachment,

    pub uploader_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub task_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub uploaded_by: i64,
}

impl Attachment {
    pub async fn create<'e, E>(executor: E, data: CreateAttachment) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (task_id, filename, original_filename, file_size, uploaded_by, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, task_id, filename, original_filename, file_size, uploaded_by, uploaded_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.filename)
        .bind(data.original_filename)
        .bind(data.file_size)
        .bind(data.uploaded_by)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, filename, original_filename, file_size, uploaded_by, uploaded_at
            FROM attachments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_stored_name<'e, E>(
        executor: E,
        filename: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, filename, original_filename, file_size, uploaded_by, uploaded_at
            FROM attachments
            WHERE filename = ?
            "#,
        )
        .bind(filename)
        .fetch_optional(executor)
        .await
    }

    /// Lists a task's attachments, newest first
    pub async fn list_by_task<'e, E>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<AttachmentListItem>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AttachmentListItem>(
            r#"
            SELECT a.id, a.task_id, a.filename, a.original_filename, a.file_size,
                   a.uploaded_by, a.uploaded_at, u.full_name AS uploader_name
            FROM attachments a
            LEFT JOIN users u ON a.uploaded_by = u.id
            WHERE a.task_id = ?
            ORDER BY a.uploaded_at DESC, a.id DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Stored names of every attachment on a task
    pub async fn stored_names_for_task<'e, E>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT filename FROM attachments WHERE task_id = ? ORDER BY id")
            .bind(task_id)
            .fetch_all(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_task<'e, E>(executor: E, task_id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM attachments WHERE task_id = ?")
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
