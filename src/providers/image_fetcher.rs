use crate::core::{FetchOutcome, ImageFetcher};
use crate::providers::util::BROWSER_USER_AGENT;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, instrument};

/// Single-shot image GET over a shared client. Retrying is the caller's business.
pub struct RemoteImageFetcher {
    client: reqwest::Client,
    min_bytes: usize,
}

impl RemoteImageFetcher {
    pub fn new(timeout: Duration, min_bytes: usize) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("image/*"));
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build image HTTP client")?;
        Ok(Self { client, min_bytes })
    }
}

#[async_trait]
impl ImageFetcher for RemoteImageFetcher {
    #[instrument(name = "ImageFetch", skip(self))]
    async fn get(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(anyhow!("Request error: {e} for URL: {url}")),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Rejected {
                status: status.as_u16(),
                len: 0,
            };
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return FetchOutcome::Failed(anyhow!("Body error: {e} for URL: {url}")),
        };
        debug!(status = %status, len = bytes.len(), "Received image response");

        // Generic favicon placeholders are tiny
        if bytes.len() <= self.min_bytes {
            return FetchOutcome::Rejected {
                status: status.as_u16(),
                len: bytes.len(),
            };
        }
        FetchOutcome::Image(bytes.to_vec())
    }
}
