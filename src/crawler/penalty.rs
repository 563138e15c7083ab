use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::CrawlerConfig;
use crate::crawler::WorkerPool;
use crate::domain::{EnrichedRecord, ProgressHandle, RawEntry, SiteDescriptor};
use crate::extractor::collect_attachments;
use crate::fetcher::Fetcher;
use crate::normalizer::{deduplicate, normalize_entries, sort_by_date_desc};
use crate::pagination::resolve_pages;
use crate::parser::parse_page_items;

pub const ATTACHMENT_PHASE_MESSAGE: &str = "parsing complete, collecting attachments";

/// One listing page of one site.
struct PageJob {
    site: SiteDescriptor,
    url: String,
}

impl std::fmt::Display for PageJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Crawls penalty listings: pages, entries, then attachments from each detail page.
pub struct PenaltyCrawler {
    fetcher: Arc<dyn Fetcher>,
    pool: WorkerPool,
    detail_delay: Duration,
    collect_attachments: bool,
}

impl PenaltyCrawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, pool: WorkerPool, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            pool,
            detail_delay: config.detail_delay(),
            collect_attachments: config.collect_attachments,
        }
    }

    pub async fn run(&self, sites: &[SiteDescriptor], max_pages: u32) -> Vec<EnrichedRecord> {
        self.run_with_progress(sites, max_pages, &ProgressHandle::new())
            .await
    }

    /// Deduplicated records, newest first. `progress` counts pages, then detail fetches.
    pub async fn run_with_progress(
        &self,
        sites: &[SiteDescriptor],
        max_pages: u32,
        progress: &ProgressHandle,
    ) -> Vec<EnrichedRecord> {
        let jobs = self.resolve_all(sites, max_pages).await;
        info!("Crawling {} listing page(s) across {} site(s)", jobs.len(), sites.len());
        progress.set_total(jobs.len());

        let mut entries = deduplicate(self.parse_pages(jobs, progress).await);
        normalize_entries(&mut entries);
        info!("Found {} distinct record(s)", entries.len());

        progress.set_message(ATTACHMENT_PHASE_MESSAGE);
        progress.add_total(entries.len());

        let mut records = self.enrich(entries, progress).await;
        sort_by_date_desc(&mut records);
        records
    }

    async fn resolve_all(&self, sites: &[SiteDescriptor], max_pages: u32) -> Vec<PageJob> {
        let fetcher = self.fetcher.clone();
        self.pool
            .map(
                sites.to_vec(),
                move |site: SiteDescriptor| {
                    let fetcher = fetcher.clone();
                    async move {
                        let pages = resolve_pages(fetcher.as_ref(), &site.base_url, max_pages).await;
                        pages
                            .into_iter()
                            .map(|url| PageJob {
                                site: site.clone(),
                                url,
                            })
                            .collect::<Vec<_>>()
                    }
                },
                || {},
            )
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn parse_pages(&self, jobs: Vec<PageJob>, progress: &ProgressHandle) -> Vec<RawEntry> {
        let fetcher = self.fetcher.clone();
        self.pool
            .map(
                jobs,
                move |job: PageJob| {
                    let fetcher = fetcher.clone();
                    async move {
                        let Some(html) = fetcher.fetch_text(&job.url).await else {
                            return Vec::new();
                        };
                        let items = parse_page_items(&html, &job.url, &job.site);
                        debug!("{} item(s) on {}", items.len(), job.url);
                        items
                    }
                },
                || progress.advance(),
            )
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn enrich(&self, entries: Vec<RawEntry>, progress: &ProgressHandle) -> Vec<EnrichedRecord> {
        let records: Vec<EnrichedRecord> = entries.into_iter().map(EnrichedRecord::from).collect();
        if !self.collect_attachments {
            for _ in &records {
                progress.advance();
            }
            return records;
        }

        let fetcher = self.fetcher.clone();
        let delay = self.detail_delay;
        self.pool
            .map(
                records,
                move |mut record: EnrichedRecord| {
                    let fetcher = fetcher.clone();
                    async move {
                        if let Some(html) = fetcher.fetch_text(record.url()).await {
                            record.attachments = collect_attachments(&html, record.url());
                        }
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        record
                    }
                },
                || progress.advance(),
            )
            .await
    }
}
