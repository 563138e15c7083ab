use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::app::{RegwatchError, Result};
use crate::config::CrawlerConfig;
use crate::fetcher::{charset, Fetcher};

const RETRY_BASE_MS: u64 = 200;
const RETRY_MAX_MS: u64 = 2_000;

/// Doubling connect-retry delay, capped at [`RETRY_MAX_MS`].
fn retry_delay(attempt: u32) -> Duration {
    let delay = RETRY_BASE_MS.saturating_mul(2u64.saturating_pow(attempt.min(20)));
    Duration::from_millis(delay.min(RETRY_MAX_MS))
}

pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Self::with_timeout(config, config.timeout())
    }

    /// Same client settings with a different per-request deadline.
    pub fn with_timeout(config: &CrawlerConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// Connection failures are retried with doubling, capped delays; statuses
    /// and deadlines are not.
    async fn send(&self, url: &str) -> Result<Response> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < self.max_retries => {
                    let delay = retry_delay(attempt);
                    debug!("Connect to {} failed ({}), retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn checked(&self, url: &str) -> Result<Response> {
        let response = self.send(url).await?;
        if response.status() != StatusCode::OK {
            return Err(RegwatchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.checked(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let header_charset = content_type.as_deref().and_then(charset::charset_from_content_type);
        Ok(charset::decode(&bytes, header_charset))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.checked(url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
