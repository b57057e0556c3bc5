use std::time::Duration;

use futures_util::StreamExt;
use url::Url;

use crate::types::{ByteStream, PageBody, TransportError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Cap on the in-memory page body; image streams are not capped.
    pub max_page_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_page_bytes: 5 * 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a page and materialize its body as text.
    async fn fetch_page(&self, url: &Url) -> Result<PageBody, TransportError>;

    /// GET an image and hand its payload back as a byte stream.
    async fn fetch_body(&self, url: &Url) -> Result<ByteStream, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// One client serves the page fetch and every image download.
    pub fn new(settings: FetchSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn send_checked(&self, url: &Url) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<PageBody, TransportError> {
        let response = self.send_checked(url).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_page_bytes {
                return Err(TransportError::TooLarge {
                    url: url.clone(),
                    max_bytes: self.settings.max_page_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let final_url = response.url().clone();
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(url, &err))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_page_bytes {
                return Err(TransportError::TooLarge {
                    url: url.clone(),
                    max_bytes: self.settings.max_page_bytes,
                    actual: Some(next_len),
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(PageBody {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            final_url,
        })
    }

    async fn fetch_body(&self, url: &Url) -> Result<ByteStream, TransportError> {
        let response = self.send_checked(url).await?;
        let origin = url.clone();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|err| map_reqwest_error(&origin, &err)));
        Ok(stream.boxed())
    }
}

fn map_reqwest_error(url: &Url, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout { url: url.clone() };
    }
    if err.is_redirect() {
        return TransportError::RedirectLimit { url: url.clone() };
    }
    TransportError::Network {
        url: url.clone(),
        message: err.to_string(),
    }
}
