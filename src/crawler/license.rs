use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::app::{RegwatchError, Result};
use crate::config::LicenseConfig;
use crate::crawler::WorkerPool;
use crate::domain::{LicenseKind, LicenseListing, LicenseRecord, NoticeRow, Progress, ProgressHandle};
use crate::extractor::{extract_fields, find_link_by_keyword, parse_listing, parse_notice_table, total_pages};
use crate::fetcher::Fetcher;
use crate::normalizer::normalize_date;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LicenseReport {
    pub registered: usize,
    pub revoked: usize,
    pub notices: usize,
}

/// Crawls the central-bank payment-institution registries and the licence-change notice.
pub struct LicenseCrawler {
    fetcher: Arc<dyn Fetcher>,
    pool: WorkerPool,
    detail_delay: Duration,
    config: LicenseConfig,
    progress: ProgressHandle,
}

impl LicenseCrawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, pool: WorkerPool, detail_delay: Duration, config: LicenseConfig) -> Self {
        Self {
            fetcher,
            pool,
            detail_delay,
            config,
            progress: ProgressHandle::new(),
        }
    }

    /// Snapshot of the current or last run.
    pub fn progress(&self) -> Progress {
        self.progress.snapshot()
    }

    fn registry_url(&self, kind: LicenseKind) -> &str {
        match kind {
            LicenseKind::Registered => &self.config.registered_url,
            LicenseKind::Revoked => &self.config.revoked_url,
        }
    }

    /// Every row of one registry, merged with its detail page.
    pub async fn crawl_registry(&self, kind: LicenseKind, progress: &ProgressHandle) -> Vec<LicenseRecord> {
        let template = self.registry_url(kind).to_string();
        let page_url = |n: u32| template.replace("{}", &n.to_string());

        let first_url = page_url(1);
        let Some(first) = self.fetcher.fetch_text(&first_url).await else {
            warn!("{}: first page unavailable, skipping", kind.label());
            return Vec::new();
        };
        let total = total_pages(&first);
        info!("{}: {} page(s)", kind.label(), total);

        progress.set_message(format!("{}: list pages", kind.label()));
        progress.add_total(total as usize);
        let mut listings = parse_listing(&first, &first_url);
        progress.advance();

        let fetcher = self.fetcher.clone();
        let rest = self
            .pool
            .map(
                (2..=total).map(page_url).collect::<Vec<_>>(),
                move |url: String| {
                    let fetcher = fetcher.clone();
                    async move {
                        match fetcher.fetch_text(&url).await {
                            Some(html) => parse_listing(&html, &url),
                            None => Vec::new(),
                        }
                    }
                },
                || progress.advance(),
            )
            .await;
        listings.extend(rest.into_iter().flatten());

        progress.set_message(format!("{}: detail pages", kind.label()));
        progress.add_total(listings.len());
        let records = self.merge_details(listings, progress).await;

        let (keyed, unkeyed): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| !r.license_number.is_empty());
        if !unkeyed.is_empty() {
            warn!("{}: dropped {} row(s) without a license number", kind.label(), unkeyed.len());
        }
        keyed
    }

    async fn merge_details(&self, listings: Vec<LicenseListing>, progress: &ProgressHandle) -> Vec<LicenseRecord> {
        let fetcher = self.fetcher.clone();
        let delay = self.detail_delay;
        self.pool
            .map(
                listings,
                move |listing: LicenseListing| {
                    let fetcher = fetcher.clone();
                    async move {
                        let details = match &listing.detail_url {
                            Some(url) => {
                                let fields = extract_fields(fetcher.as_ref(), url).await;
                                tokio::time::sleep(delay).await;
                                fields
                            }
                            None => Default::default(),
                        };
                        LicenseRecord::merge(&listing, &details, normalize_date(&listing.date))
                    }
                },
                || progress.advance(),
            )
            .await
    }

    /// Rows of the licence-change table. The directory page itself is parsed
    /// when no link mentions the keyword.
    pub async fn crawl_notices(&self) -> Vec<NoticeRow> {
        let directory = &self.config.notice_directory_url;
        let keyword = &self.config.notice_keyword;

        let target = match self.fetcher.fetch_text(directory).await {
            Some(html) => find_link_by_keyword(&html, directory, keyword),
            None => None,
        };
        let target = target.unwrap_or_else(|| {
            warn!("No link mentioning '{}' on {}, using the directory page", keyword, directory);
            directory.clone()
        });

        match self.fetcher.fetch_text(&target).await {
            Some(html) => parse_notice_table(&html),
            None => Vec::new(),
        }
    }

    /// Crawl both registries and the notice table, replacing what the store holds.
    /// Only one run at a time; a second caller gets `AlreadyRunning`.
    pub async fn run(&self, store: &dyn Store) -> Result<LicenseReport> {
        if !self.progress.try_begin("license registries") {
            return Err(RegwatchError::AlreadyRunning);
        }

        match self.run_flows(store).await {
            Ok(report) => {
                self.progress.finish("done");
                Ok(report)
            }
            Err(e) => {
                self.progress.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_flows(&self, store: &dyn Store) -> Result<LicenseReport> {
        let mut report = LicenseReport::default();

        for kind in [LicenseKind::Registered, LicenseKind::Revoked] {
            let records = self.crawl_registry(kind, &self.progress).await;
            let written = store.replace_licenses(kind, &records)?;
            match kind {
                LicenseKind::Registered => report.registered = written,
                LicenseKind::Revoked => report.revoked = written,
            }
        }

        self.progress.set_message("licence-change notices");
        let rows = self.crawl_notices().await;
        info!("Found {} licence-change notice row(s)", rows.len());
        report.notices = store.replace_notices(&rows)?;

        Ok(report)
    }
}
