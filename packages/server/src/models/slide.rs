use chrono::{DateTime, Utc};
use common::storage::BlobInfo;
use serde::{Deserialize, Serialize};

use crate::catalog::SlideMetadata;
use crate::moderation::ModerationState;

/// Longest accepted department name, in characters.
pub const MAX_DEPARTMENT_LEN: usize = 128;

/// Descriptor of a stored image.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlobResponse {
    /// Blob ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Sanitized display filename with the detected extension.
    #[schema(example = "career_fair.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub length: u64,
    pub upload_date: DateTime<Utc>,
}

impl From<&BlobInfo> for BlobResponse {
    fn from(blob: &BlobInfo) -> Self {
        Self {
            id: blob.id.to_string(),
            filename: blob.filename.clone(),
            content_type: blob.content_type.clone(),
            length: blob.length,
            upload_date: blob.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub description: String,
    /// Always `false`; new slides wait for moderation.
    pub approved: bool,
}

/// Response to a successful upload.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file: BlobResponse,
    #[schema(example = "Image uploaded successfully")]
    pub message: String,
    pub metadata: UploadMetadata,
}

/// One catalog record.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlideResponse {
    /// Blob ID of the slide image.
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub file_id: String,
    pub filename: String,
    pub content_type: String,
    pub length: u64,
    pub upload_date: DateTime<Utc>,
    pub description: String,
    pub notes: String,
    #[schema(example = "N/A")]
    pub department: String,
    pub approved: bool,
    pub status: ModerationState,
}

impl From<SlideMetadata> for SlideResponse {
    fn from(slide: SlideMetadata) -> Self {
        let status = slide.moderation_state();
        Self {
            file_id: slide.file_id.to_string(),
            filename: slide.filename,
            content_type: slide.content_type,
            length: slide.length,
            upload_date: slide.upload_date,
            description: slide.description,
            notes: slide.notes,
            department: slide.department,
            approved: slide.approved,
            status,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlideListResponse {
    pub slides: Vec<SlideResponse>,
    pub total: u64,
    /// Present when there is nothing to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SlideListResponse {
    pub fn new(slides: Vec<SlideMetadata>) -> Self {
        let total = slides.len() as u64;
        Self {
            slides: slides.into_iter().map(SlideResponse::from).collect(),
            total,
            message: None,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    #[schema(example = "Slide approved")]
    pub message: String,
    /// Number of records the update matched.
    #[schema(example = 1)]
    pub matched_count: u64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EditDepartmentRequest {
    #[schema(example = "Computer Science")]
    pub department: String,
}

impl EditDepartmentRequest {
    /// Trimmed department name, 1 to 128 characters.
    pub fn validate(&self) -> Result<String, String> {
        let department = self.department.trim();
        let len = department.chars().count();
        if len == 0 || len > MAX_DEPARTMENT_LEN {
            return Err(format!(
                "Department must be 1-{MAX_DEPARTMENT_LEN} characters"
            ));
        }
        Ok(department.to_string())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Slide deleted")]
    pub message: String,
}
