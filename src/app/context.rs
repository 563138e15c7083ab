use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{RegwatchError, Result};
use crate::config::Config;
use crate::crawler::{CrawlSession, LicenseCrawler, PenaltyCrawler, WorkerPool};
use crate::domain::SiteDescriptor;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub penalties: Arc<PenaltyCrawler>,
    pub licenses: LicenseCrawler,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = match &config.store.data_dir {
            Some(dir) => dir.clone(),
            None => Self::default_data_dir()?,
        };
        let store = Arc::new(SqliteStore::for_schema(&data_dir, &config.store.schema)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawler)?);
        let license_fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::with_timeout(
            &config.crawler,
            config.crawler.license_timeout(),
        )?);
        Ok(Self::with_parts(config, store, fetcher, license_fetcher))
    }

    /// Wire crawlers around the given store and transports.
    pub fn with_parts(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher>,
        license_fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let pool = WorkerPool::new(config.crawler.workers);
        let penalties = Arc::new(PenaltyCrawler::new(fetcher.clone(), pool.clone(), &config.crawler));
        let licenses = LicenseCrawler::new(
            license_fetcher,
            pool,
            config.crawler.detail_delay(),
            config.licenses.clone(),
        );

        Self {
            config,
            store,
            fetcher,
            penalties,
            licenses,
        }
    }

    pub fn sites(&self) -> Vec<SiteDescriptor> {
        self.config.sites()
    }

    /// A background crawl session over every configured site.
    pub fn session(&self) -> CrawlSession {
        CrawlSession::new(self.penalties.clone(), self.sites(), self.config.crawler.max_pages)
    }

    fn default_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| RegwatchError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("regwatch"))
    }
}
