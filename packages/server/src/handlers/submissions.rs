use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Moderator;
use crate::extractors::json::AppJson;
use crate::gate::SubmissionFlag;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/submissions-status",
    tag = "Submissions",
    operation_id = "getSubmissionsStatus",
    summary = "Whether new uploads are accepted",
    responses(
        (status = 200, description = "Current flag", body = SubmissionFlag),
    ),
)]
#[instrument(skip(state))]
pub async fn get_status(State(state): State<AppState>) -> Json<SubmissionFlag> {
    Json(SubmissionFlag {
        submissions_enabled: state.gate.is_enabled().await,
    })
}

#[utoipa::path(
    put,
    path = "/submissions-status",
    tag = "Submissions",
    operation_id = "setSubmissionsStatus",
    summary = "Open or close submissions",
    request_body = SubmissionFlag,
    responses(
        (status = 200, description = "Flag updated", body = SubmissionFlag),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, moderator), fields(by = %moderator.subject))]
pub async fn set_status(
    moderator: Moderator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmissionFlag>,
) -> Result<Json<SubmissionFlag>, AppError> {
    state.gate.set(payload.submissions_enabled).await?;
    Ok(Json(payload))
}
