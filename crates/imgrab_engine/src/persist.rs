use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::types::{ByteStream, TransportError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("download directory missing or not writable: {0}")]
    Directory(String),
    #[error(transparent)]
    Transport(TransportError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the download directory exists; create if missing.
pub fn ensure_download_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::Directory(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::Directory("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::Directory(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StoreError::Directory(e.to_string()))?;
    Ok(())
}

/// Success record for one stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub bytes_written: u64,
}

#[async_trait::async_trait]
pub trait ImageSink: Send + Sync {
    /// Drain `body` into a new file named `name`. Never overwrites an
    /// existing file; a partially written file is left behind if the
    /// stream faults mid-way.
    async fn store(&self, name: &str, body: ByteStream) -> Result<StoredImage, StoreError>;
}

/// Streams payloads into `create_new` files under one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait::async_trait]
impl ImageSink for DirectorySink {
    async fn store(&self, name: &str, mut body: ByteStream) -> Result<StoredImage, StoreError> {
        let path = self.dir.join(name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let mut bytes_written = 0u64;
        let mut fault = None;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => {
                    file.write_all(&chunk).await?;
                    bytes_written += chunk.len() as u64;
                }
                Err(err) => {
                    fault = Some(err);
                    break;
                }
            }
        }
        // Flush even on a stream fault; the bytes received before it
        // must reach the partial file.
        file.flush().await?;

        match fault {
            Some(err) => Err(StoreError::Transport(err)),
            None => Ok(StoredImage {
                path,
                bytes_written,
            }),
        }
    }
}
