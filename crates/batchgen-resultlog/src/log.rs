use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::record::JsonlRecord;

#[derive(Debug, thiserror::Error)]
pub enum ResultLogError {
    #[error("result log I/O error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to serialize result record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An append-only JSONL file, safe to write to concurrently from many
/// workers.
///
/// A single `tokio::sync::Mutex` serializes writes; each write is a
/// `write_all` of one JSON line followed by an explicit `flush`, so a
/// crash never leaves a line half-written to disk.
pub struct ResultLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultLog {
    /// Opens (or truncates) `path` for appending.
    ///
    /// When `preserve_existing` is true (the `--resume` case) an existing
    /// file is kept and appended to; otherwise it is truncated, matching a
    /// fresh run.
    pub async fn init(path: impl AsRef<Path>, preserve_existing: bool) -> Result<Self, ResultLogError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| ResultLogError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        if preserve_existing && path.exists() {
            info!(path = %path.display(), "resuming: keeping existing result log");
        } else {
            info!(path = %path.display(), "initializing result log");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .truncate(!preserve_existing)
            .open(&path)
            .await
            .map_err(|source| ResultLogError::Io { path: path.display().to_string(), source })?;

        Ok(Self { path, file: Mutex::new(file) })
    }

    /// Appends one record as a single JSON line.
    pub async fn append(&self, record: &JsonlRecord) -> Result<(), ResultLogError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await.map_err(|source| ResultLogError::Io { path: self.path.display().to_string(), source })?;
        file.flush().await.map_err(|source| ResultLogError::Io { path: self.path.display().to_string(), source })?;
        debug!(artist = %record.artist_name, path = %self.path.display(), "appended result record");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
