use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;
use url::Url;

/// An image payload as it arrives from the wire, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// A fetched page, materialized in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBody {
    pub text: String,
    /// Location after redirects; every image reference resolves against this.
    pub final_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not build http client: {0}")]
    Client(String),
    #[error("request to {url} failed: {message}")]
    Network { url: Url, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: Url },
    #[error("redirect limit exceeded for {url}")]
    RedirectLimit { url: Url },
    #[error("{url} answered with status {status}")]
    Status { url: Url, status: u16 },
    #[error("page at {url} too large (max {max_bytes}, actual {actual:?})")]
    TooLarge {
        url: Url,
        max_bytes: u64,
        actual: Option<u64>,
    },
}
