use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{BlobId, BlobInfo};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::catalog::SlideFilter;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Moderator;
use crate::extractors::json::AppJson;
use crate::models::slide::{
    EditDepartmentRequest, MessageResponse, ModerationResponse, SlideListResponse,
};
use crate::moderation::{self, ModerationAction};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/image/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download an image by id",
    description = "Streams the stored image with its detected content type. \
        Supports ETag-based caching via If-None-Match.",
    params(("id" = String, Path, description = "Blob ID (UUID)")),
    responses(
        (status = 200, description = "Image content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_READ_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = BlobId::parse(&id)?;
    let info = state.blobs.stat(&id).await?;
    build_blob_response(&state, &info, &headers).await
}

#[utoipa::path(
    get,
    path = "/image/by-name/{filename}",
    tag = "Images",
    operation_id = "getImageByName",
    summary = "Download an image by display filename",
    description = "Filenames are not unique. When several images share one, the most recently \
        stored wins.",
    params(("filename" = String, Path, description = "Display filename, e.g. `flyer.png`")),
    responses(
        (status = 200, description = "Image content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_READ_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_image_by_name(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let info = state.blobs.find_by_name(&filename).await?;
    build_blob_response(&state, &info, &headers).await
}

#[utoipa::path(
    get,
    path = "/list-images",
    tag = "Moderation",
    operation_id = "listImages",
    summary = "List every slide",
    description = "All catalog records in upload order, pending and approved.",
    responses(
        (status = 200, description = "Slide list", body = SlideListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator), fields(by = %moderator.subject))]
pub async fn list_images(
    moderator: Moderator,
    State(state): State<AppState>,
) -> Result<Json<SlideListResponse>, AppError> {
    let slides = state.catalog.find(SlideFilter::all()).await?;
    Ok(Json(SlideListResponse::new(slides)))
}

#[utoipa::path(
    get,
    path = "/list-approved-images",
    tag = "Images",
    operation_id = "listApprovedImages",
    summary = "List approved slides",
    description = "Public view of the catalog. Pending slides are never included.",
    responses(
        (status = 200, description = "Approved slide list", body = SlideListResponse),
        (status = 500, description = "Catalog failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_approved_images(
    State(state): State<AppState>,
) -> Result<Json<SlideListResponse>, AppError> {
    let slides = state.catalog.find(SlideFilter::approved()).await?;
    let mut response = SlideListResponse::new(slides);
    if response.slides.is_empty() {
        response.message = Some("No approved slides found".into());
    }
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/approve-slide/{id}",
    tag = "Moderation",
    operation_id = "approveSlide",
    summary = "Approve a slide",
    description = "Makes the slide publicly listed. Approving an approved slide succeeds.",
    params(("id" = String, Path, description = "Blob ID (UUID)")),
    responses(
        (status = 200, description = "Slide approved", body = ModerationResponse),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Slide not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator), fields(by = %moderator.subject))]
pub async fn approve_slide(
    moderator: Moderator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModerationResponse>, AppError> {
    apply_moderation(&state, &id, ModerationAction::Approve).await
}

#[utoipa::path(
    put,
    path = "/decline-slide/{id}",
    tag = "Moderation",
    operation_id = "declineSlide",
    summary = "Decline a slide",
    description = "Returns the slide to pending, removing it from the public list.",
    params(("id" = String, Path, description = "Blob ID (UUID)")),
    responses(
        (status = 200, description = "Slide declined", body = ModerationResponse),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Slide not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator), fields(by = %moderator.subject))]
pub async fn decline_slide(
    moderator: Moderator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModerationResponse>, AppError> {
    apply_moderation(&state, &id, ModerationAction::Decline).await
}

#[utoipa::path(
    put,
    path = "/edit-department/{id}",
    tag = "Moderation",
    operation_id = "editDepartment",
    summary = "Set a slide's department",
    params(("id" = String, Path, description = "Blob ID (UUID)")),
    request_body = EditDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = ModerationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Slide not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator, payload), fields(by = %moderator.subject))]
pub async fn edit_department(
    moderator: Moderator,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<EditDepartmentRequest>,
) -> Result<Json<ModerationResponse>, AppError> {
    let id = BlobId::parse(&id)?;
    let department = payload.validate().map_err(AppError::Validation)?;

    let matched = state.catalog.update_department(id, &department).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Slide not found".into()));
    }

    Ok(Json(ModerationResponse {
        message: "Department updated".into(),
        matched_count: matched,
    }))
}

#[utoipa::path(
    delete,
    path = "/delete-slide/{id}",
    tag = "Moderation",
    operation_id = "deleteSlide",
    summary = "Delete a slide",
    description = "Deletes the image, then its catalog record. If the image cannot be deleted \
        the record is kept.",
    params(("id" = String, Path, description = "Blob ID (UUID)")),
    responses(
        (status = 200, description = "Slide deleted", body = MessageResponse),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Slide not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator), fields(by = %moderator.subject))]
pub async fn delete_slide(
    moderator: Moderator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = BlobId::parse(&id)?;
    state.ingest.retract(id).await?;
    Ok(Json(MessageResponse {
        message: "Slide deleted".into(),
    }))
}

async fn apply_moderation(
    state: &AppState,
    id: &str,
    action: ModerationAction,
) -> Result<Json<ModerationResponse>, AppError> {
    let id = BlobId::parse(id)?;
    let matched = moderation::moderate(&*state.catalog, id, action).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Slide not found".into()));
    }

    Ok(Json(ModerationResponse {
        message: format!("Slide {}", action.verb()),
        matched_count: matched,
    }))
}

/// Build a streaming response for a committed blob.
async fn build_blob_response(
    state: &AppState,
    info: &BlobInfo,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    // Blobs are immutable, so the id is a strong validator.
    let etag_value = format!("\"{}\"", info.id);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = state.blobs.get_stream(&info.id).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &info.content_type)
        .header(header::CONTENT_LENGTH, info.length.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&info.filename),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe inline `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "image".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
