use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "slide")]
pub struct Model {
    /// Surrogate key; only used to keep insertion order.
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identifier of the blob holding the image bytes.
    #[sea_orm(unique)]
    pub file_id: Uuid,

    pub filename: String,

    /// Detected MIME type, copied from the blob.
    pub content_type: String,

    /// Size in bytes, copied from the blob.
    pub length: i64,

    pub upload_date: DateTimeUtc,

    pub description: String,

    pub notes: String,

    pub department: String,

    pub approved: bool,
}

impl ActiveModelBehavior for ActiveModel {}
