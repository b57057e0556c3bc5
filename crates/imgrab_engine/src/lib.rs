//! Imgrab engine: page scan and concurrent image download pipeline.
mod download;
mod extract;
mod fetch;
mod filename;
mod parallel;
mod persist;
mod pipeline;
mod types;

pub use download::{DownloadError, DownloadFailure, DownloadReceipt, DownloadTask};
pub use extract::{resolve_reference, ExtractError, Extractor, ImgTagExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{random_destination_name, IMAGE_FILE_EXT};
pub use parallel::{BatchOutcome, ParallelDownloader, DEFAULT_WORKER_SLOTS};
pub use persist::{ensure_download_dir, DirectorySink, ImageSink, StoreError, StoredImage};
pub use pipeline::{ImagePipeline, PipelineError};
pub use types::{ByteStream, PageBody, TransportError};
