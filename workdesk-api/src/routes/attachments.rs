/// Attachment endpoints
///
/// # Endpoints
///
/// - `GET /tasks/:id/attachments` - Files of a visible task
/// - `POST /tasks/:id/attachments` - Multipart upload, field `file`
/// - `GET /attachments/:id/download` - Download by attachment ID
/// - `GET /attachments/download/:filename` - Download by stored name
/// - `DELETE /attachments/:id` - Uploader, admin or manager

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use workdesk_shared::{
    auth::context::AuthContext,
    models::attachment::{Attachment, AttachmentListItem},
    services::attachments::{self, Download, Upload},
    CoreError,
};

const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Pulls the `file` part out of a multipart body
///
/// Other parts are skipped. A missing part is a validation failure.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { filename, content });
    }

    Err(CoreError::invalid(FILE_FIELD, "No file selected").into())
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Keeps only characters that are safe inside a quoted header parameter
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn file_response(download: Download) -> ApiResult<Response> {
    let content_type = content_type_for(&download.attachment.filename);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe(download.display_name())
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::InternalError(format!("Invalid content disposition: {}", e)))?;

    let mut response = download.content.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Vec<AttachmentListItem>>> {
    Ok(Json(attachments::list(&state.db, &ctx, task_id).await?))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    let upload = read_upload(&mut multipart).await?;

    let attachment = attachments::upload(
        &state.db,
        state.store.as_ref(),
        &ctx,
        task_id,
        upload,
        state.max_upload_bytes(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let download = attachments::download(&state.db, state.store.as_ref(), &ctx, id).await?;
    file_response(download)
}

pub async fn download_by_filename(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let download =
        attachments::download_by_stored_name(&state.db, state.store.as_ref(), &ctx, &filename)
            .await?;
    file_response(download)
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    attachments::delete(&state.db, state.store.as_ref(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("abc.PDF"), "application/pdf");
        assert_eq!(content_type_for("abc.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_header_safe() {
        assert_eq!(header_safe("Q1 report.pdf"), "Q1 report.pdf");
        assert_eq!(header_safe("say \"hi\".txt"), "say _hi_.txt");
        assert_eq!(header_safe("résumé.doc"), "r_sum_.doc");
        assert_eq!(header_safe("line\nbreak.txt"), "line_break.txt");
    }
}
