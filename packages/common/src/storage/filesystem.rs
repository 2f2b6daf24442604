use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::error::StorageError;
use super::id::BlobId;
use super::traits::{BlobInfo, BlobStore, BoxReader};

/// Default chunk size: 255 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

const MANIFEST_FILE: &str = "manifest.json";
const STAGING_DIR: &str = ".staging";
const TRASH_DIR: &str = ".trash";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(flatten)]
    info: BlobInfo,
    chunk_size: usize,
    chunk_count: u32,
}

/// Filesystem-backed chunked blob store.
///
/// Each blob is a directory holding fixed-size chunk files plus a manifest:
/// `{base_path}/{shard}/{id}/chunk.{n:08}` and `{base_path}/{shard}/{id}/manifest.json`.
/// Writes are assembled under `.staging/` and published with a single rename.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    chunk_size: usize,
    max_size: Option<u64>,
}

impl FilesystemBlobStore {
    /// Open (or create) a store rooted at `base_path`.
    ///
    /// Leftovers in the staging and trash areas belong to writes and deletes
    /// that never finished, and are removed.
    pub async fn new(base_path: PathBuf, chunk_size: usize) -> Result<Self, StorageError> {
        if chunk_size == 0 {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "chunk size must be greater than zero",
            )));
        }

        fs::create_dir_all(&base_path).await?;
        for dir in [STAGING_DIR, TRASH_DIR] {
            let path = base_path.join(dir);
            match fs::remove_dir_all(&path).await {
                Ok(()) => debug!(path = %path.display(), "swept stale blob work area"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            fs::create_dir_all(&path).await?;
        }

        Ok(Self {
            base_path,
            chunk_size,
            max_size: None,
        })
    }

    /// Reject writes larger than `max_size` bytes.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Directory holding a committed blob.
    fn blob_dir(&self, id: &BlobId) -> PathBuf {
        self.base_path
            .join(id.shard_prefix())
            .join(id.to_string())
    }

    async fn read_manifest(&self, id: &BlobId) -> Result<Manifest, StorageError> {
        read_manifest_at(&self.blob_dir(id), &id.to_string()).await
    }
}

fn chunk_file_name(index: u32) -> String {
    format!("chunk.{index:08}")
}

async fn read_manifest_at(dir: &Path, key: &str) -> Result<Manifest, StorageError> {
    let raw = match fs::read(dir.join(MANIFEST_FILE)).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&raw).map_err(|e| StorageError::CorruptManifest {
        id: key.to_string(),
        reason: e.to_string(),
    })
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
async fn read_full<R: AsyncRead + Unpin + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, StorageError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// A blob under construction. Removed on drop unless committed, so an error
/// or a cancelled future leaves nothing behind.
struct StagedBlob {
    path: PathBuf,
    committed: bool,
}

impl StagedBlob {
    async fn create(path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir(&path).await?;
        Ok(Self {
            path,
            committed: false,
        })
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut file = fs::File::create(self.path.join(name)).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Publish the staged directory at `dest`.
    ///
    /// Once the rename is dispatched the blocking task owns the staging
    /// directory: it either publishes it whole or removes it, even if this
    /// future is dropped meanwhile.
    async fn commit(mut self, dest: &Path) -> Result<(), StorageError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let from = self.path.clone();
        let to = dest.to_path_buf();
        self.committed = true;
        tokio::task::spawn_blocking(move || {
            std::fs::rename(&from, &to).inspect_err(|_| {
                let _ = std::fs::remove_dir_all(&from);
            })
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(())
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if !self.committed {
            // Best effort.
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        filename: &str,
        content_type: &str,
        mut reader: BoxReader,
    ) -> Result<BlobInfo, StorageError> {
        let id = BlobId::generate();
        let staged = StagedBlob::create(self.base_path.join(STAGING_DIR).join(id.to_string())).await?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut length: u64 = 0;
        let mut chunk_count: u32 = 0;

        loop {
            let filled = read_full(&mut reader, &mut buf).await?;
            if filled == 0 {
                break;
            }

            length += filled as u64;
            if let Some(limit) = self.max_size
                && length > limit
            {
                return Err(StorageError::SizeLimitExceeded {
                    actual: length,
                    limit,
                });
            }

            staged
                .write_file(&chunk_file_name(chunk_count), &buf[..filled])
                .await?;
            chunk_count += 1;

            if filled < buf.len() {
                break;
            }
        }

        let info = BlobInfo {
            id,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            length,
            created_at: Utc::now(),
        };
        let manifest = Manifest {
            info: info.clone(),
            chunk_size: self.chunk_size,
            chunk_count,
        };
        let encoded = serde_json::to_vec(&manifest).map_err(|e| StorageError::CorruptManifest {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        staged.write_file(MANIFEST_FILE, &encoded).await?;

        staged.commit(&self.blob_dir(&id)).await?;
        debug!(%id, length, chunk_count, "blob committed");

        Ok(info)
    }

    async fn get_stream(&self, id: &BlobId) -> Result<BoxReader, StorageError> {
        let manifest = self.read_manifest(id).await?;
        let dir = self.blob_dir(id);

        let paths: Vec<PathBuf> = (0..manifest.chunk_count)
            .map(|index| dir.join(chunk_file_name(index)))
            .collect();
        let chunks = stream::iter(paths).then(|path| async move { fs::read(path).await.map(Bytes::from) });

        Ok(Box::new(StreamReader::new(Box::pin(chunks))))
    }

    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        Ok(self.read_manifest(id).await?.info)
    }

    async fn find_by_name(&self, filename: &str) -> Result<BlobInfo, StorageError> {
        let mut latest: Option<BlobInfo> = None;

        let mut shards = fs::read_dir(&self.base_path).await?;
        while let Some(shard) = shards.next_entry().await? {
            if shard.file_name().to_string_lossy().starts_with('.')
                || !shard.file_type().await?.is_dir()
            {
                continue;
            }

            let mut blobs = fs::read_dir(shard.path()).await?;
            while let Some(entry) = blobs.next_entry().await? {
                if !entry.file_type().await?.is_dir() {
                    continue;
                }

                let key = entry.file_name().to_string_lossy().into_owned();
                let manifest = match read_manifest_at(&entry.path(), &key).await {
                    Ok(manifest) => manifest,
                    // Deleted between listing and reading.
                    Err(StorageError::NotFound(_)) => continue,
                    Err(StorageError::CorruptManifest { id, reason }) => {
                        warn!(%id, %reason, "skipping blob with unreadable manifest");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if manifest.info.filename != filename {
                    continue;
                }

                let candidate = manifest.info;
                if latest.as_ref().is_none_or(|current| {
                    (candidate.created_at, candidate.id) > (current.created_at, current.id)
                }) {
                    latest = Some(candidate);
                }
            }
        }

        latest.ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }

    async fn exists(&self, id: &BlobId) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_dir(id).join(MANIFEST_FILE)).await?)
    }

    async fn delete(&self, id: &BlobId) -> Result<bool, StorageError> {
        let trash = self
            .base_path
            .join(TRASH_DIR)
            .join(format!("{id}-{}", uuid::Uuid::new_v4()));

        match fs::rename(self.blob_dir(id), &trash).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = fs::remove_dir_all(&trash).await {
            warn!(%id, error = %e, "failed to purge chunks of deleted blob");
        }

        Ok(true)
    }
}
