use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::extract::{ExtractError, Extractor};
use crate::fetch::Fetcher;
use crate::parallel::{BatchOutcome, ParallelDownloader};
use crate::persist::ImageSink;
use crate::types::TransportError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch page: {0}")]
    Page(#[from] TransportError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Sequences one run: fetch the page, extract its image references,
/// fan the downloads out and join them. A failure before fan-out
/// aborts with zero tasks dispatched.
pub struct ImagePipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    downloader: ParallelDownloader,
}

impl ImagePipeline {
    /// The page fetch and every download share `fetcher`, so both go
    /// through the same client and worker pool.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn ImageSink>,
        max_in_flight: usize,
    ) -> Self {
        let downloader =
            ParallelDownloader::new(Arc::clone(&fetcher), sink).with_max_in_flight(max_in_flight);
        Self {
            fetcher,
            extractor,
            downloader,
        }
    }

    pub async fn run(&self, start: &Url) -> Result<BatchOutcome, PipelineError> {
        let page = self.fetcher.fetch_page(start).await?;
        let targets = self.extractor.extract(&page.final_url, &page.text)?;
        log::info!(
            "found {} image references in {}",
            targets.len(),
            page.final_url
        );
        Ok(self.downloader.run_all(targets).await)
    }
}
