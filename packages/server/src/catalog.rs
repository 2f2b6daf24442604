//! The slide catalog: one metadata row per committed blob.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::{BlobId, BlobInfo};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;

use crate::entity::slide;
use crate::moderation::ModerationState;

/// Department assigned to new submissions.
pub const DEFAULT_DEPARTMENT: &str = "N/A";

/// Catalog record describing an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideMetadata {
    pub file_id: BlobId,
    pub filename: String,
    pub content_type: String,
    pub length: u64,
    pub upload_date: DateTime<Utc>,
    pub description: String,
    pub notes: String,
    pub department: String,
    pub approved: bool,
}

impl SlideMetadata {
    /// A fresh, unmoderated record for a committed blob.
    pub fn pending(blob: &BlobInfo, description: String, notes: String) -> Self {
        Self {
            file_id: blob.id,
            filename: blob.filename.clone(),
            content_type: blob.content_type.clone(),
            length: blob.length,
            upload_date: blob.created_at,
            description,
            notes,
            department: DEFAULT_DEPARTMENT.to_string(),
            approved: false,
        }
    }

    pub fn moderation_state(&self) -> ModerationState {
        ModerationState::from_approved(self.approved)
    }
}

/// Which records a `find` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideFilter {
    pub approved: Option<bool>,
}

impl SlideFilter {
    /// Every record. Privileged.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only approved records. The public view.
    pub fn approved() -> Self {
        Self {
            approved: Some(true),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog database error: {0}")]
    Database(#[from] DbErr),
    #[error("corrupt catalog row for {file_id}: {reason}")]
    Corrupt { file_id: String, reason: String },
}

/// Queryable index of accepted uploads and their moderation state.
///
/// Records are keyed by blob id; filenames are labels only.
#[async_trait]
pub trait SlideCatalog: Send + Sync {
    async fn insert(&self, slide: SlideMetadata) -> Result<(), CatalogError>;

    /// Matching records in insertion order.
    async fn find(&self, filter: SlideFilter) -> Result<Vec<SlideMetadata>, CatalogError>;

    async fn find_by_file_id(&self, file_id: BlobId)
    -> Result<Option<SlideMetadata>, CatalogError>;

    /// Returns the number of records matched, whether or not they changed.
    async fn update_approval(&self, file_id: BlobId, approved: bool) -> Result<u64, CatalogError>;

    /// Returns the number of records matched.
    async fn update_department(
        &self,
        file_id: BlobId,
        department: &str,
    ) -> Result<u64, CatalogError>;

    /// Returns the number of records deleted.
    async fn delete_by_file_id(&self, file_id: BlobId) -> Result<u64, CatalogError>;
}

/// SeaORM-backed catalog.
#[derive(Clone)]
pub struct SeaOrmSlideCatalog {
    db: DatabaseConnection,
}

impl SeaOrmSlideCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl TryFrom<slide::Model> for SlideMetadata {
    type Error = CatalogError;

    fn try_from(model: slide::Model) -> Result<Self, Self::Error> {
        let length = u64::try_from(model.length).map_err(|_| CatalogError::Corrupt {
            file_id: model.file_id.to_string(),
            reason: format!("negative length {}", model.length),
        })?;

        Ok(Self {
            file_id: BlobId::from_uuid(model.file_id),
            filename: model.filename,
            content_type: model.content_type,
            length,
            upload_date: model.upload_date,
            description: model.description,
            notes: model.notes,
            department: model.department,
            approved: model.approved,
        })
    }
}

#[async_trait]
impl SlideCatalog for SeaOrmSlideCatalog {
    async fn insert(&self, slide: SlideMetadata) -> Result<(), CatalogError> {
        let length = i64::try_from(slide.length).map_err(|_| CatalogError::Corrupt {
            file_id: slide.file_id.to_string(),
            reason: format!("length {} does not fit the length column", slide.length),
        })?;
        let model = slide::ActiveModel {
            id: NotSet,
            file_id: Set(slide.file_id.as_uuid()),
            filename: Set(slide.filename),
            content_type: Set(slide.content_type),
            length: Set(length),
            upload_date: Set(slide.upload_date),
            description: Set(slide.description),
            notes: Set(slide.notes),
            department: Set(slide.department),
            approved: Set(slide.approved),
        };

        slide::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn find(&self, filter: SlideFilter) -> Result<Vec<SlideMetadata>, CatalogError> {
        let mut query = slide::Entity::find();
        if let Some(approved) = filter.approved {
            query = query.filter(slide::Column::Approved.eq(approved));
        }

        query
            .order_by_asc(slide::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(SlideMetadata::try_from)
            .collect()
    }

    async fn find_by_file_id(
        &self,
        file_id: BlobId,
    ) -> Result<Option<SlideMetadata>, CatalogError> {
        slide::Entity::find()
            .filter(slide::Column::FileId.eq(file_id.as_uuid()))
            .one(&self.db)
            .await?
            .map(SlideMetadata::try_from)
            .transpose()
    }

    async fn update_approval(&self, file_id: BlobId, approved: bool) -> Result<u64, CatalogError> {
        let result = slide::Entity::update_many()
            .col_expr(slide::Column::Approved, Expr::value(approved))
            .filter(slide::Column::FileId.eq(file_id.as_uuid()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_department(
        &self,
        file_id: BlobId,
        department: &str,
    ) -> Result<u64, CatalogError> {
        let result = slide::Entity::update_many()
            .col_expr(slide::Column::Department, Expr::value(department))
            .filter(slide::Column::FileId.eq(file_id.as_uuid()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_by_file_id(&self, file_id: BlobId) -> Result<u64, CatalogError> {
        let result = slide::Entity::delete_many()
            .filter(slide::Column::FileId.eq(file_id.as_uuid()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
