use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 3;

/// Settings shared by every crawl flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Concurrent page/detail fetches (default: 3)
    pub workers: usize,

    /// Per-request deadline for penalty listings in seconds (default: 5)
    pub timeout_secs: u64,

    /// Per-request deadline for license-registry pages in seconds (default: 15)
    pub license_timeout_secs: u64,

    /// Retries after a failed connection attempt (default: 3)
    pub max_retries: u32,

    /// Pause after each detail-page fetch in milliseconds (default: 200)
    pub detail_delay_ms: u64,

    /// Listing pages visited per site (default: 5)
    pub max_pages: u32,

    /// Idle keep-alive connections per host (default: 10)
    pub pool_max_idle_per_host: usize,

    /// Visit each detail page for file links (default: true)
    pub collect_attachments: bool,

    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: 5,
            license_timeout_secs: 15,
            max_retries: 3,
            detail_delay_ms: 200,
            max_pages: 5,
            pool_max_idle_per_host: 10,
            collect_attachments: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn license_timeout(&self) -> Duration {
        Duration::from_secs(self.license_timeout_secs)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = CrawlerConfig::default();
        assert_eq!(config.workers, 3);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.license_timeout(), Duration::from_secs(15));
        assert_eq!(config.detail_delay(), Duration::from_millis(200));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert!(config.collect_attachments);
    }
}
