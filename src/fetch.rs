//! HTTP content fetching
//!
//! The scheduler talks to the network through the [`Fetcher`] trait so tests
//! can substitute scripted responses. The production implementation wraps a
//! single shared reqwest client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{trace, warn};

use crate::config::FetchConfig;

/// Network seam for the poll scheduler
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the raw content behind a URL.
    ///
    /// A transport failure or non-success status is an error; an empty body
    /// is a completed fetch and is returned as-is.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reqwest-backed fetcher
///
/// The HTTP client is built once and reused across requests. The configured
/// timeout bounds every attempt; retries are a fixed number of extra
/// attempts with a fixed delay between them.
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            retries: config.retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        trace!("requesting content from {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to send HTTP request")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let body = response
            .bytes()
            .await
            .context("failed to read response body")?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "fetch attempt {attempt}/{} for {url} failed: {e:#}, retrying",
                        self.retries + 1
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
