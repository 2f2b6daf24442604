use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::id::BlobId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Descriptor of a committed blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    pub id: BlobId,
    /// Display label. Not unique.
    pub filename: String,
    pub content_type: String,
    /// Total size in bytes.
    pub length: u64,
    pub created_at: DateTime<Utc>,
}

/// Identifier-addressed, write-once blob storage.
///
/// A blob becomes visible only once `put_stream` returns `Ok`; a failed or
/// cancelled write never leaves a partial blob behind.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a display name and return the committed descriptor.
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<BlobInfo, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(filename, content_type, reader).await
    }

    /// Store data from an async reader and return the committed descriptor.
    async fn put_stream(
        &self,
        filename: &str,
        content_type: &str,
        reader: BoxReader,
    ) -> Result<BlobInfo, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, id: &BlobId) -> Result<BoxReader, StorageError>;

    /// Fetch the descriptor of a committed blob.
    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError>;

    /// Resolve a display name to the most recently written blob carrying it.
    ///
    /// Names are not identities: when several blobs share one, the latest by
    /// creation time (then by id) wins.
    async fn find_by_name(&self, filename: &str) -> Result<BlobInfo, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, id: &BlobId) -> Result<bool, StorageError>;

    /// Delete a blob as a whole unit.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, id: &BlobId) -> Result<bool, StorageError>;
}
