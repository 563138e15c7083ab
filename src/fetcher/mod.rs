pub mod charset;
pub mod http_fetcher;

use async_trait::async_trait;
use tracing::warn;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Page transport. Implementations return the decoded body of a 200 response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Raw body, for file downloads.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch(url).await.map(String::into_bytes)
    }

    /// Like [`Fetcher::fetch`] but every failure becomes `None` after being logged.
    async fn fetch_text(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}
