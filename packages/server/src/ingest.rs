//! Upload and retraction flows spanning the blob store and the catalog.
//!
//! A submission writes the blob first and records it in the catalog only once
//! the write is durable. If the catalog insert fails the blob is deleted again,
//! so a successful flow never leaves a blob without a row or a row without a
//! blob.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use common::storage::{BlobId, BlobInfo, BlobStore, BoxReader, StorageError};
use thiserror::Error;
use tracing::instrument;

use crate::catalog::{CatalogError, SlideCatalog, SlideMetadata};
use crate::gate::SubmissionGate;
use crate::validation::{self, CandidateUpload, UploadPolicy, ValidationError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("submissions are currently closed")]
    SubmissionsDisabled,
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error("blob write failed: {0}")]
    StorageWrite(StorageError),
    #[error("blob write did not finish within {0:?}")]
    StorageTimeout(Duration),
    #[error("catalog insert failed: {0}")]
    CatalogWrite(CatalogError),
    #[error("slide {0} not found")]
    NotFound(BlobId),
    #[error("blob delete failed: {0}")]
    StorageDelete(StorageError),
    #[error(transparent)]
    Catalog(CatalogError),
}

/// Free-form fields supplied alongside an upload.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDetails {
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub blob: BlobInfo,
    pub slide: SlideMetadata,
}

pub struct Ingestor {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn SlideCatalog>,
    gate: Arc<SubmissionGate>,
    policy: UploadPolicy,
    write_timeout: Duration,
}

impl Ingestor {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn SlideCatalog>,
        gate: Arc<SubmissionGate>,
        policy: UploadPolicy,
        write_timeout: Duration,
    ) -> Self {
        Self {
            blobs,
            catalog,
            gate,
            policy,
            write_timeout,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate, store and catalog one upload. The new slide is pending.
    #[instrument(skip_all, fields(declared_name = ?upload.declared_name, size = upload.bytes.len()))]
    pub async fn submit(
        &self,
        upload: CandidateUpload,
        details: SubmissionDetails,
    ) -> Result<Submission, IngestError> {
        if !self.gate.is_enabled().await {
            return Err(IngestError::SubmissionsDisabled);
        }

        let accepted = validation::validate(&self.policy, upload)?;
        let filename = accepted.filename();
        let content_type = accepted.detected_mime();

        let reader: BoxReader = Box::new(Cursor::new(accepted.bytes));
        let blob = tokio::time::timeout(
            self.write_timeout,
            self.blobs.put_stream(&filename, content_type, reader),
        )
        .await
        .map_err(|_| IngestError::StorageTimeout(self.write_timeout))?
        .map_err(IngestError::StorageWrite)?;

        let slide = SlideMetadata::pending(
            &blob,
            details.description.unwrap_or_default(),
            details.notes.unwrap_or_default(),
        );

        if let Err(e) = self.catalog.insert(slide.clone()).await {
            tracing::warn!(file_id = %blob.id, error = %e, "Catalog insert failed, deleting blob");
            if let Err(del) = self.blobs.delete(&blob.id).await {
                tracing::error!(file_id = %blob.id, error = %del, "Compensating delete failed, blob is orphaned");
            }
            return Err(IngestError::CatalogWrite(e));
        }

        tracing::info!(file_id = %blob.id, filename = %blob.filename, "Slide submitted");
        Ok(Submission { blob, slide })
    }

    /// Delete a slide's blob, then its catalog row.
    ///
    /// A failed blob delete leaves the row untouched. A row whose blob is
    /// already gone is still removed.
    #[instrument(skip(self))]
    pub async fn retract(&self, file_id: BlobId) -> Result<(), IngestError> {
        let blob_deleted = match self.blobs.delete(&file_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                let still_present = self.blobs.exists(&file_id).await.ok();
                tracing::warn!(
                    %file_id,
                    error = %e,
                    ?still_present,
                    "Blob delete failed, keeping catalog row"
                );
                return Err(IngestError::StorageDelete(e));
            }
        };

        let rows = self
            .catalog
            .delete_by_file_id(file_id)
            .await
            .map_err(IngestError::Catalog)?;

        match (blob_deleted, rows) {
            (false, 0) => Err(IngestError::NotFound(file_id)),
            (false, _) => {
                tracing::warn!(%file_id, "Removed catalog row whose blob was already missing");
                Ok(())
            }
            (true, 0) => {
                tracing::warn!(%file_id, "Removed blob that had no catalog row");
                Ok(())
            }
            (true, _) => {
                tracing::info!(%file_id, "Slide deleted");
                Ok(())
            }
        }
    }
}
