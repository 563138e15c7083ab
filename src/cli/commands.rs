use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use crate::app::{AppContext, RegwatchError, Result};
use crate::crawler::{crawl_and_save, CrawlSession};
use crate::domain::{CrawlStatus, EnrichedRecord, LicenseKind, SaveReport};
use crate::download::{Downloader, DOWNLOAD_DELAY};
use crate::normalizer::{keywords_present, DateRange};
use crate::store::Store;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| RegwatchError::Other(e.to_string()))
}

pub async fn crawl_penalties(ctx: &AppContext, provinces: &[String], json: bool, progress: bool) -> Result<()> {
    let max_pages = ctx.config.crawler.max_pages;

    let (records, report) = if progress && provinces.len() <= 1 {
        let session = ctx.session();
        let records = watch(&session, provinces.first().map(String::as_str)).await?;
        let report = ctx.store.save_penalties(&records)?;
        (records, report)
    } else {
        let filter = (!provinces.is_empty()).then_some(provinces);
        crawl_and_save(ctx, filter, max_pages).await?
    };

    if json {
        println!("{}", to_json(&records)?);
    } else {
        print_summary(&records, report);
    }
    Ok(())
}

/// Start a session crawl and print its progress until it ends.
async fn watch(session: &CrawlSession, province: Option<&str>) -> Result<Vec<EnrichedRecord>> {
    let mut handle = match province {
        Some(p) => session.start_one(p)?,
        None => session.start_all()?,
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            joined = &mut handle => {
                joined.map_err(|e| RegwatchError::Other(e.to_string()))?;
                break;
            }
            _ = ticker.tick() => {
                let p = session.progress();
                eprintln!("[{}/{}] {}", p.current, p.total, p.message);
            }
        }
    }

    let progress = session.progress();
    if progress.status == CrawlStatus::Error {
        return Err(RegwatchError::Other(progress.message));
    }
    Ok(session.records())
}

fn print_summary(records: &[EnrichedRecord], report: SaveReport) {
    for record in records {
        println!(
            "{:10} {} {} {}",
            record.date(),
            record.entry.province,
            record.entry.branch,
            record.entry.title
        );
        for attachment in &record.attachments {
            println!("           {} {}", attachment.name, attachment.url);
        }
    }

    let watched = keywords_present(records.iter().map(|r| r.entry.title.as_str()));
    if !watched.is_empty() {
        println!("Watched names found: {}", watched.join(", "));
    }
    println!(
        "Crawled {} records: {} new, {} seen before, {} failed to save",
        records.len(),
        report.inserted,
        report.touched,
        report.failed
    );
}

pub async fn crawl_licenses(ctx: &AppContext, progress: bool) -> Result<()> {
    let run = ctx.licenses.run(ctx.store.as_ref());
    tokio::pin!(run);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let report = loop {
        tokio::select! {
            report = &mut run => break report?,
            _ = ticker.tick(), if progress => {
                let p = ctx.licenses.progress();
                eprintln!("[{}/{}] {}", p.current, p.total, p.message);
            }
        }
    };

    println!(
        "{}: {}, {}: {}, licence-change notices: {}",
        LicenseKind::Registered.label(),
        report.registered,
        LicenseKind::Revoked.label(),
        report.revoked,
        report.notices
    );
    Ok(())
}

pub fn list_penalties(
    ctx: &AppContext,
    province: Option<&str>,
    range: DateRange,
    keyword: Option<&str>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let records: Vec<_> = ctx
        .store
        .penalties(province)?
        .into_iter()
        .filter(|r| range.contains(r.publish_date, today))
        .filter(|r| keyword.is_none_or(|k| r.document_title.contains(k)))
        .collect();

    if records.is_empty() {
        println!("No penalties");
        return Ok(());
    }

    for record in &records {
        println!(
            "{} {} {} {}\n  {}",
            record.display_date(),
            record.province,
            record.branch,
            record.document_title,
            record.download_url
        );
    }

    let watched = keywords_present(records.iter().map(|r| r.document_title.as_str()));
    if !watched.is_empty() {
        println!("Watched names found: {}", watched.join(", "));
    }
    Ok(())
}

pub fn list_sites(ctx: &AppContext) -> Result<()> {
    let counts = ctx.store.province_counts()?;
    for site in ctx.sites() {
        let stored = counts
            .iter()
            .find(|(p, _)| *p == site.province)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        println!(
            "{:8} {:8} {:>5} stored  {}",
            site.province, site.dialect, stored, site.base_url
        );
    }
    Ok(())
}

pub async fn download(ctx: &AppContext, province: &str, dir: Option<PathBuf>) -> Result<()> {
    let records = ctx.store.penalties(Some(province))?;
    if records.is_empty() {
        println!("No stored penalties for {}", province);
        return Ok(());
    }

    let dir = match dir {
        Some(d) => d,
        None => dirs::download_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("regwatch")
            .join(province),
    };

    println!("Downloading {} documents to {}", records.len(), dir.display());
    let downloader = Downloader::new(ctx.fetcher.clone(), DOWNLOAD_DELAY);
    let report = downloader.download_all(&records, &dir).await?;
    println!(
        "Saved {}, no document {}, failed {}",
        report.saved, report.missing, report.failed
    );
    Ok(())
}
