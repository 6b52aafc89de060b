//! HTTP client for detail pages and assets.

mod response;
mod user_agent;

pub use response::FetchResponse;
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Errors from a single GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// Capability to GET a URL with a per-request timeout.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed [`PageFetcher`] sending a browser identity.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    /// `timeout` bounds requests that do not pass their own.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status,
            body.len(),
            start.elapsed().as_millis()
        );

        Ok(FetchResponse {
            url: url.to_string(),
            status,
            body,
        })
    }
}
