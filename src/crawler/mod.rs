//! Crawl orchestration: a bounded worker pool and the flows that run on it.

pub mod license;
pub mod penalty;
pub mod pool;
pub mod session;

use tracing::info;

use crate::app::{AppContext, RegwatchError, Result};
use crate::domain::{select_sites, EnrichedRecord, SaveReport};
use crate::store::Store;

pub use license::{LicenseCrawler, LicenseReport};
pub use penalty::{PenaltyCrawler, ATTACHMENT_PHASE_MESSAGE};
pub use pool::WorkerPool;
pub use session::{CrawlSession, RecordCache};

/// Crawl the named provinces (all configured sites for `None`) and persist the result.
pub async fn crawl_and_save(
    ctx: &AppContext,
    provinces: Option<&[String]>,
    max_pages: u32,
) -> Result<(Vec<EnrichedRecord>, SaveReport)> {
    let configured = ctx.sites();
    if let Some(wanted) = provinces {
        if let Some(unknown) = wanted.iter().find(|p| !configured.iter().any(|s| &s.province == *p)) {
            return Err(RegwatchError::UnknownProvince(unknown.clone()));
        }
    }

    let sites = select_sites(&configured, provinces);
    info!("Starting penalty crawl of {} site(s)", sites.len());

    let records = ctx.penalties.run(&sites, max_pages).await;
    let report = ctx.store.save_penalties(&records)?;
    Ok((records, report))
}

pub async fn run_spider(ctx: &AppContext, provinces: Option<&[String]>, max_pages: u32) -> Result<SaveReport> {
    crawl_and_save(ctx, provinces, max_pages)
        .await
        .map(|(_, report)| report)
}
