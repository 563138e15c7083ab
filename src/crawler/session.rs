use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::{RegwatchError, Result};
use crate::crawler::PenaltyCrawler;
use crate::domain::{EnrichedRecord, Progress, ProgressHandle, SiteDescriptor};
use crate::normalizer::sort_by_date_desc;

pub const UNKNOWN_PROVINCE_MESSAGE: &str = "unknown province";
pub const DONE_MESSAGE: &str = "done";

/// Results of the latest crawls, newest first.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    inner: Arc<RwLock<Vec<EnrichedRecord>>>,
}

impl RecordCache {
    fn read(&self) -> RwLockReadGuard<'_, Vec<EnrichedRecord>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<EnrichedRecord>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn records(&self) -> Vec<EnrichedRecord> {
        self.read().clone()
    }

    pub fn replace_all(&self, mut records: Vec<EnrichedRecord>) {
        sort_by_date_desc(&mut records);
        *self.write() = records;
    }

    /// Swap out one province's records and keep everyone else's.
    pub fn replace_province(&self, province: &str, records: Vec<EnrichedRecord>) {
        let mut cached = self.write();
        cached.retain(|r| r.province() != province);
        cached.extend(records);
        sort_by_date_desc(&mut cached);
    }
}

enum Scope {
    All,
    Province(String),
}

/// Background penalty crawls behind a pollable progress handle. Only one
/// crawl runs at a time.
#[derive(Clone)]
pub struct CrawlSession {
    crawler: Arc<PenaltyCrawler>,
    sites: Arc<Vec<SiteDescriptor>>,
    max_pages: u32,
    progress: ProgressHandle,
    cache: RecordCache,
}

impl CrawlSession {
    pub fn new(crawler: Arc<PenaltyCrawler>, sites: Vec<SiteDescriptor>, max_pages: u32) -> Self {
        Self {
            crawler,
            sites: Arc::new(sites),
            max_pages,
            progress: ProgressHandle::new(),
            cache: RecordCache::default(),
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress.snapshot()
    }

    pub fn records(&self) -> Vec<EnrichedRecord> {
        self.cache.records()
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn start_all(&self) -> Result<JoinHandle<()>> {
        if !self.progress.try_begin("crawling all provinces") {
            return Err(RegwatchError::AlreadyRunning);
        }
        Ok(self.launch(self.sites.to_vec(), Scope::All))
    }

    pub fn start_one(&self, province: &str) -> Result<JoinHandle<()>> {
        if self.progress.is_running() {
            return Err(RegwatchError::AlreadyRunning);
        }
        let Some(site) = self.sites.iter().find(|s| s.province == province).cloned() else {
            self.progress.fail(UNKNOWN_PROVINCE_MESSAGE);
            return Err(RegwatchError::UnknownProvince(province.to_string()));
        };
        if !self.progress.try_begin(format!("crawling {province}")) {
            return Err(RegwatchError::AlreadyRunning);
        }
        Ok(self.launch(vec![site], Scope::Province(province.to_string())))
    }

    fn launch(&self, sites: Vec<SiteDescriptor>, scope: Scope) -> JoinHandle<()> {
        let crawler = self.crawler.clone();
        let progress = self.progress.clone();
        let cache = self.cache.clone();
        let max_pages = self.max_pages;

        tokio::spawn(async move {
            let crawl = {
                let progress = progress.clone();
                tokio::spawn(async move { crawler.run_with_progress(&sites, max_pages, &progress).await })
            };

            match crawl.await {
                Ok(records) => {
                    info!("Crawl finished with {} record(s)", records.len());
                    match scope {
                        Scope::All => cache.replace_all(records),
                        Scope::Province(province) => cache.replace_province(&province, records),
                    }
                    progress.finish(DONE_MESSAGE);
                }
                Err(e) => {
                    error!("Crawl aborted: {}", e);
                    progress.fail(e.to_string());
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawler::WorkerPool;
    use crate::domain::{CrawlStatus, RawEntry};
    use crate::fetcher::Fetcher;
    use async_trait::async_trait;

    fn record(province: &str, url: &str, date: &str) -> EnrichedRecord {
        EnrichedRecord::new(RawEntry::new(province, format!("{province}分行"), "t", url, date))
    }

    #[test]
    fn test_replace_province_keeps_others_and_resorts() {
        let cache = RecordCache::default();
        cache.replace_all(vec![
            record("海南省", "h1", "2024-01-01"),
            record("北京市", "b1", "2024-02-01"),
        ]);

        cache.replace_province("海南省", vec![record("海南省", "h2", "2024-03-01")]);

        let urls: Vec<_> = cache.records().iter().map(|r| r.url().to_string()).collect();
        assert_eq!(urls, vec!["h2", "b1"]);
        assert_eq!(cache.records().len(), 2);
    }

    struct SlowFetcher;

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Err(RegwatchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn session() -> CrawlSession {
        let crawler = PenaltyCrawler::new(Arc::new(SlowFetcher), WorkerPool::new(3), &CrawlerConfig::default());
        CrawlSession::new(
            Arc::new(crawler),
            vec![SiteDescriptor::new("海南省", "https://haikou.test/index.html")],
            5,
        )
    }

    #[tokio::test]
    async fn test_second_start_is_refused_while_running() {
        let session = session();
        let handle = session.start_all().unwrap();
        assert_eq!(session.progress().status, CrawlStatus::Running);
        assert!(matches!(session.start_all(), Err(RegwatchError::AlreadyRunning)));
        assert!(matches!(session.start_one("海南省"), Err(RegwatchError::AlreadyRunning)));

        handle.await.unwrap();
        let progress = session.progress();
        assert_eq!(progress.status, CrawlStatus::Done);
        assert_eq!(progress.message, DONE_MESSAGE);
        assert_eq!(progress.current, progress.total);
        assert!(session.records().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_province() {
        let session = session();
        assert!(matches!(
            session.start_one("火星"),
            Err(RegwatchError::UnknownProvince(_))
        ));
        let progress = session.progress();
        assert_eq!(progress.status, CrawlStatus::Error);
        assert_eq!(progress.message, UNKNOWN_PROVINCE_MESSAGE);

        session.start_one("海南省").unwrap().await.unwrap();
        assert_eq!(session.progress().status, CrawlStatus::Done);
    }
}
