use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::fetch::Fetcher;
use crate::filename::{random_destination_name, IMAGE_FILE_EXT};
use crate::persist::{ImageSink, StoreError, StoredImage};
use crate::types::TransportError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("persist: {0}")]
    Persist(StoreError),
    #[error("download worker terminated abnormally: {0}")]
    Worker(String),
}

impl From<StoreError> for DownloadError {
    fn from(err: StoreError) -> Self {
        // A mid-stream transport fault surfaces through the sink; keep it
        // on the transport arm.
        match err {
            StoreError::Transport(err) => DownloadError::Transport(err),
            other => DownloadError::Persist(other),
        }
    }
}

/// Success record for one finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub target: Url,
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Terminal failure of one task, still tied to its target.
#[derive(Debug)]
pub struct DownloadFailure {
    pub target: Url,
    pub error: DownloadError,
}

/// One image download: fetch the target's byte stream and drain it into
/// a freshly named destination file.
#[derive(Debug)]
pub struct DownloadTask {
    pub target: Url,
    pub destination: String,
}

impl DownloadTask {
    pub fn new(target: Url) -> Self {
        Self {
            destination: random_destination_name(IMAGE_FILE_EXT),
            target,
        }
    }

    pub async fn run(
        self,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn ImageSink>,
    ) -> Result<DownloadReceipt, DownloadFailure> {
        let worker = current_worker();
        log::info!("[{worker}] downloading {}", self.target);

        match fetch_and_store(&self, fetcher.as_ref(), sink.as_ref()).await {
            Ok(stored) => {
                log::info!(
                    "[{worker}] stored {} as {}",
                    self.target,
                    stored.path.display()
                );
                Ok(DownloadReceipt {
                    target: self.target,
                    path: stored.path,
                    bytes_written: stored.bytes_written,
                })
            }
            Err(error) => {
                log::warn!("[{worker}] failed {}: {error}", self.target);
                Err(DownloadFailure {
                    target: self.target,
                    error,
                })
            }
        }
    }
}

async fn fetch_and_store(
    task: &DownloadTask,
    fetcher: &dyn Fetcher,
    sink: &dyn ImageSink,
) -> Result<StoredImage, DownloadError> {
    let body = fetcher.fetch_body(&task.target).await?;
    let stored = sink.store(&task.destination, body).await?;
    Ok(stored)
}

fn current_worker() -> String {
    std::thread::current().name().unwrap_or("worker").to_string()
}
