/// Attachment lifecycle
///
/// Files are stored under `<uuid-v4 hex>.<ext>`, independent of the name the
/// uploader supplied, so two uploads never collide and a stored name is never
/// reused. The supplied name (final path component only) is kept for display.
///
/// Reads and uploads require the owning task to be visible to the actor.
/// Deletes follow the ownership rule instead: the uploader, or any admin or
/// manager.

use bytes::Bytes;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::context::AuthContext;
use crate::auth::policy::{authorize, Action};
use crate::auth::scope::TaskScope;
use crate::error::{CoreError, CoreResult};
use crate::models::attachment::{Attachment, AttachmentListItem, CreateAttachment};
use crate::models::task::Task;
use crate::storage::{validate_stored_name, BlobStore, StagedBlob};

/// Extensions accepted on upload, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 11] = [
    "pdf", "doc", "docx", "xls", "xlsx", "csv", "txt", "png", "jpg", "jpeg", "gif",
];

/// Default upper bound on a single upload
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file as received from the caller
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name supplied by the client, possibly with a path
    pub filename: String,
    pub content: Bytes,
}

/// File contents ready to be sent back
#[derive(Debug, Clone)]
pub struct Download {
    pub attachment: Attachment,
    pub content: Bytes,
}

impl Download {
    /// Name to present to the user
    pub fn display_name(&self) -> &str {
        &self.attachment.original_filename
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckedName {
    original: String,
    extension: String,
}

/// Strips any directory part and checks the extension
fn check_filename(raw: &str) -> CoreResult<CheckedName> {
    let original = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if original.is_empty() {
        return Err(CoreError::invalid("file", "No file selected"));
    }

    let extension = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            CoreError::invalid(
                "file",
                format!("File type not allowed. Accepted: {}", ALLOWED_EXTENSIONS.join(", ")),
            )
        })?;

    Ok(CheckedName { original, extension })
}

fn stored_name_for(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), extension)
}

/// Stores a file and records it against a visible task
pub async fn upload(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    task_id: i64,
    file: Upload,
    max_bytes: usize,
) -> CoreResult<Attachment> {
    authorize(ctx, Action::UploadAttachment)?;

    let name = check_filename(&file.filename)?;
    if file.content.is_empty() {
        return Err(CoreError::invalid("file", "File is empty"));
    }
    if file.content.len() > max_bytes {
        return Err(CoreError::invalid(
            "file",
            format!("File exceeds the maximum size of {} bytes", max_bytes),
        ));
    }

    let scope = TaskScope::for_actor(ctx);
    if Task::find_visible(pool, task_id, &scope).await?.is_none() {
        return Err(CoreError::NotFound("Task"));
    }

    let stored = stored_name_for(&name.extension);
    let size = file.content.len() as i64;
    store.put(&stored, file.content).await?;

    let recorded = Attachment::create(
        pool,
        CreateAttachment {
            task_id,
            filename: stored.clone(),
            original_filename: name.original,
            file_size: size,
            uploaded_by: ctx.user_id,
        },
    )
    .await;

    match recorded {
        Ok(attachment) => {
            info!(
                attachment_id = attachment.id,
                task_id,
                user_id = ctx.user_id,
                size,
                "Attachment uploaded"
            );
            Ok(attachment)
        }
        Err(e) => {
            if let Err(remove_err) = store.remove(&stored).await {
                warn!(blob = %stored, error = %remove_err, "Failed to remove orphaned blob");
            }
            Err(e.into())
        }
    }
}

/// Lists the attachments of a visible task
pub async fn list(
    pool: &SqlitePool,
    ctx: &AuthContext,
    task_id: i64,
) -> CoreResult<Vec<AttachmentListItem>> {
    let scope = TaskScope::for_actor(ctx);
    if Task::find_visible(pool, task_id, &scope).await?.is_none() {
        return Err(CoreError::NotFound("Task"));
    }

    Ok(Attachment::list_by_task(pool, task_id).await?)
}

async fn read_visible(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    attachment: Attachment,
) -> CoreResult<Download> {
    let scope = TaskScope::for_actor(ctx);
    if Task::find_visible(pool, attachment.task_id, &scope)
        .await?
        .is_none()
    {
        return Err(CoreError::NotFound("Attachment"));
    }

    let content = store.get(&attachment.filename).await?;
    Ok(Download { attachment, content })
}

/// Downloads by attachment ID
pub async fn download(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    attachment_id: i64,
) -> CoreResult<Download> {
    let attachment = Attachment::find_by_id(pool, attachment_id)
        .await?
        .ok_or(CoreError::NotFound("Attachment"))?;

    read_visible(pool, store, ctx, attachment).await
}

/// Downloads by stored name
///
/// Names that could leave the storage root are rejected before any lookup.
pub async fn download_by_stored_name(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    filename: &str,
) -> CoreResult<Download> {
    if validate_stored_name(filename).is_err() {
        warn!(user_id = ctx.user_id, "Rejected unsafe download name");
        return Err(CoreError::invalid("filename", "Invalid file name"));
    }

    let attachment = Attachment::find_by_stored_name(pool, filename)
        .await?
        .ok_or(CoreError::NotFound("Attachment"))?;

    read_visible(pool, store, ctx, attachment).await
}

/// Deletes an attachment row and its blob as one unit
///
/// The row is deleted inside a transaction and the blob is staged before the
/// commit; the staged blob is purged only after commit and restored if the
/// commit fails. A concurrent second delete of the same attachment sees
/// `NotFound`.
pub async fn delete(
    pool: &SqlitePool,
    store: &dyn BlobStore,
    ctx: &AuthContext,
    attachment_id: i64,
) -> CoreResult<()> {
    let attachment = Attachment::find_by_id(pool, attachment_id)
        .await?
        .ok_or(CoreError::NotFound("Attachment"))?;

    authorize(
        ctx,
        Action::DeleteAttachment {
            uploader: attachment.uploaded_by,
        },
    )?;

    let mut tx = pool.begin().await?;

    if !Attachment::delete(&mut *tx, attachment_id).await? {
        return Err(CoreError::NotFound("Attachment"));
    }

    let staged: Option<StagedBlob> = match store.stage_removal(&attachment.filename).await {
        Ok(staged) => {
            if staged.is_none() {
                warn!(attachment_id, blob = %attachment.filename, "Attachment blob already missing");
            }
            staged
        }
        Err(e) => {
            tx.rollback().await?;
            tracing::error!(attachment_id, error = %e, "Failed to stage attachment blob");
            return Err(CoreError::StorageFailure(e.to_string()));
        }
    };

    if let Err(e) = tx.commit().await {
        if let Some(blob) = &staged {
            super::restore_staged(store, std::slice::from_ref(blob)).await;
        }
        return Err(e.into());
    }

    if let Some(blob) = &staged {
        super::purge_staged(store, std::slice::from_ref(blob)).await;
    }

    info!(
        attachment_id,
        task_id = attachment.task_id,
        user_id = ctx.user_id,
        "Attachment deleted"
    );
    Ok(())
}
