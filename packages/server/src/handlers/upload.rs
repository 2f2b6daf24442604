use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::ingest::SubmissionDetails;
use crate::models::slide::{BlobResponse, UploadMetadata, UploadResponse};
use crate::state::AppState;
use crate::validation::{CandidateUpload, ValidationError};

/// Room for multipart framing and the text fields on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Body limit layer for the upload route.
pub fn upload_body_limit(max_bytes: u64) -> DefaultBodyLimit {
    let limit = max_bytes.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Uploads",
    operation_id = "uploadSlide",
    summary = "Submit a slide or flyer image",
    description = "Accepts a PNG or JPEG in the `file` multipart field, with optional `description` \
        and `notes` text fields. The declared type must match the file's real signature. \
        The stored slide starts out pending moderation.",
    request_body(content_type = "multipart/form-data", description = "Image upload with optional description and notes"),
    responses(
        (status = 201, description = "Slide stored", body = UploadResponse),
        (status = 400, description = "Rejected upload (NO_FILE, PAYLOAD_TOO_LARGE, UNSUPPORTED_TYPE, SIGNATURE_MISMATCH, VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage or catalog failure (STORAGE_WRITE_FAILED, CATALOG_WRITE_FAILED)", body = ErrorBody),
        (status = 503, description = "Submissions closed (SUBMISSIONS_DISABLED)", body = ErrorBody),
        (status = 504, description = "Storage timed out (STORAGE_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_slide(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // Refuse early so a closed gate never reads the body.
    if !state.gate.is_enabled().await {
        return Err(AppError::SubmissionsDisabled);
    }

    let max_bytes = state.ingest.policy().max_bytes;
    let mut candidate: Option<CandidateUpload> = None;
    let mut details = SubmissionDetails::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        match field.name() {
            Some("file") => {
                let declared_name = field.file_name().map(str::to_string);
                let declared_mime = field.content_type().map(str::to_string);
                let bytes = read_bounded(field, max_bytes).await?;
                candidate = Some(CandidateUpload {
                    declared_name,
                    declared_mime,
                    bytes,
                });
            }
            Some("description") => {
                details.description = Some(read_text(field, "description", max_bytes).await?);
            }
            Some("notes") => {
                details.notes = Some(read_text(field, "notes", max_bytes).await?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let candidate = candidate.ok_or(AppError::Upload(ValidationError::NoFile))?;
    let submission = state.ingest.submit(candidate, details).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file: BlobResponse::from(&submission.blob),
            message: "Image uploaded successfully".into(),
            metadata: UploadMetadata {
                description: submission.slide.description,
                approved: submission.slide.approved,
            },
        }),
    ))
}

/// Buffer a file field, giving up as soon as it grows past `max_bytes`.
async fn read_bounded(mut field: Field<'_>, max_bytes: u64) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if (buf.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::Upload(ValidationError::PayloadTooLarge {
                limit: max_bytes,
            }));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: Field<'_>, name: &str, max_bytes: u64) -> Result<String, AppError> {
    field.text().await.map_err(|e| match multipart_error(e, max_bytes) {
        AppError::Validation(msg) => AppError::Validation(format!("Failed to read {name}: {msg}")),
        other => other,
    })
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Upload(ValidationError::PayloadTooLarge { limit: max_bytes })
    } else {
        AppError::Validation(format!("Multipart error: {}", err.body_text()))
    }
}
