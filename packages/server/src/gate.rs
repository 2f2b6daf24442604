//! Process-wide switch that accepts or rejects new submissions.
//!
//! The flag lives in a small JSON file so operators can flip it without a
//! restart. Reads are cached for a short TTL; writes replace the file
//! atomically and refresh the cache.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFlag {
    pub submissions_enabled: bool,
}

impl Default for SubmissionFlag {
    fn default() -> Self {
        Self {
            submissions_enabled: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to write submissions flag: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode submissions flag: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy)]
struct Cached {
    enabled: bool,
    loaded_at: Instant,
}

pub struct SubmissionGate {
    path: PathBuf,
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
}

impl SubmissionGate {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current flag value. A missing or unreadable file means enabled.
    pub async fn is_enabled(&self) -> bool {
        if let Some(cached) = *self.cached.read().await
            && cached.loaded_at.elapsed() < self.ttl
        {
            return cached.enabled;
        }
        self.reload().await
    }

    /// Re-reads the flag file, bypassing the cache.
    pub async fn reload(&self) -> bool {
        let enabled = read_flag(&self.path).await.submissions_enabled;
        *self.cached.write().await = Some(Cached {
            enabled,
            loaded_at: Instant::now(),
        });
        enabled
    }

    /// Persists the flag. Concurrent readers see either the old or the new
    /// file, never a partial one.
    pub async fn set(&self, enabled: bool) -> Result<(), GateError> {
        let mut cached = self.cached.write().await;

        let body = serde_json::to_vec_pretty(&SubmissionFlag {
            submissions_enabled: enabled,
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        let tmp = PathBuf::from(tmp);

        if let Err(e) = write_then_rename(&tmp, &self.path, &body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        *cached = Some(Cached {
            enabled,
            loaded_at: Instant::now(),
        });
        tracing::info!(enabled, path = %self.path.display(), "Submissions flag updated");
        Ok(())
    }
}

async fn write_then_rename(tmp: &Path, dest: &Path, body: &[u8]) -> std::io::Result<()> {
    fs::write(tmp, body).await?;
    fs::rename(tmp, dest).await
}

async fn read_flag(path: &Path) -> SubmissionFlag {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SubmissionFlag::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read submissions flag, assuming enabled");
            return SubmissionFlag::default();
        }
    };

    serde_json::from_slice(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Malformed submissions flag, assuming enabled");
        SubmissionFlag::default()
    })
}
