use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::catalog::CatalogError;
use crate::gate::GateError;
use crate::ingest::IngestError;
use crate::validation::ValidationError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable error description.
    #[schema(example = "Invalid file type. Only PNG and JPEG are allowed.")]
    pub error: String,
    /// Machine-readable error code. One of: `NO_FILE`, `PAYLOAD_TOO_LARGE`,
    /// `UNSUPPORTED_TYPE`, `SIGNATURE_MISMATCH`, `VALIDATION_ERROR`,
    /// `SUBMISSIONS_DISABLED`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `STORAGE_TIMEOUT`,
    /// `STORAGE_WRITE_FAILED`, `STORAGE_READ_FAILED`, `CATALOG_WRITE_FAILED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "UNSUPPORTED_TYPE")]
    pub code: &'static str,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Upload(ValidationError),
    SubmissionsDisabled,
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    StorageTimeout,
    StorageWrite(String),
    StorageRead(String),
    CatalogWrite(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    code: "VALIDATION_ERROR",
                },
            ),
            AppError::Upload(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err.to_string(),
                    code: err.code(),
                },
            ),
            AppError::SubmissionsDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "Submissions are currently closed.".into(),
                    code: "SUBMISSIONS_DISABLED",
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "Authentication required".into(),
                    code: "TOKEN_MISSING",
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "Invalid or expired token".into(),
                    code: "TOKEN_INVALID",
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "Insufficient permissions".into(),
                    code: "PERMISSION_DENIED",
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg,
                    code: "NOT_FOUND",
                },
            ),
            AppError::StorageTimeout => {
                tracing::error!("Blob write timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorBody {
                        error: "Storage did not respond in time".into(),
                        code: "STORAGE_TIMEOUT",
                    },
                )
            }
            AppError::StorageWrite(detail) => {
                tracing::error!("Blob write failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Error uploading image".into(),
                        code: "STORAGE_WRITE_FAILED",
                    },
                )
            }
            AppError::StorageRead(detail) => {
                tracing::error!("Blob read failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Error retrieving image".into(),
                        code: "STORAGE_READ_FAILED",
                    },
                )
            }
            AppError::CatalogWrite(detail) => {
                tracing::error!("Catalog write failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Error saving slide metadata".into(),
                        code: "CATALOG_WRITE_FAILED",
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "An unexpected error occurred".into(),
                        code: "INTERNAL_ERROR",
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Upload(err)
    }
}

/// Read-side storage errors.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => AppError::NotFound(format!("Image '{what}' not found")),
            StorageError::InvalidId(id) => AppError::Validation(format!("Invalid image id '{id}'")),
            other => AppError::StorageRead(other.to_string()),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::SubmissionsDisabled => AppError::SubmissionsDisabled,
            IngestError::Rejected(e) => AppError::Upload(e),
            IngestError::StorageTimeout(_) => AppError::StorageTimeout,
            IngestError::StorageWrite(e) => AppError::StorageWrite(e.to_string()),
            IngestError::CatalogWrite(e) => AppError::CatalogWrite(e.to_string()),
            IngestError::NotFound(id) => AppError::NotFound(format!("Slide '{id}' not found")),
            IngestError::StorageDelete(e) => AppError::Internal(e.to_string()),
            IngestError::Catalog(e) => AppError::Internal(e.to_string()),
        }
    }
}
