//! Saves the document behind each stored penalty to disk.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::PenaltyRecord;
use crate::fetcher::Fetcher;
use crate::parser::dom::selector;
use crate::parser::normalize_href;

/// Pause between records.
pub const DOWNLOAD_DELAY: Duration = Duration::from_millis(500);

pub const DOCUMENT_EXTENSIONS: &[&str] = &[".doc", ".docx", ".pdf", ".xls", ".xlsx", ".et", ".wps"];

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|\r\n]"#).expect("valid regex"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

pub fn sanitize_filename(name: &str) -> String {
    INVALID_CHARS.replace_all(name, "").trim().to_string()
}

/// The first link on a page that points at a document, with its extension.
pub fn first_document_link(html: &str, page_url: &str) -> Option<(String, &'static str)> {
    let document = Html::parse_document(html);
    document.select(&LINKS).find_map(|a| {
        let href = a.value().attr("href")?.trim();
        let lower = href.to_lowercase();
        let ext = DOCUMENT_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext))?;
        Some((normalize_href(page_url, href)?, *ext))
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub saved: usize,
    pub missing: usize,
    pub failed: usize,
}

pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    delay: Duration,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    /// Fetch the record's detail page and save its first document as
    /// `<dir>/<title><ext>`. `None` when the page links no document.
    pub async fn download_record(&self, record: &PenaltyRecord, dir: &Path) -> Result<Option<PathBuf>> {
        let html = self.fetcher.fetch(&record.download_url).await?;
        let Some((url, ext)) = first_document_link(&html, &record.download_url) else {
            return Ok(None);
        };

        let mut stem = sanitize_filename(&record.document_title);
        if stem.is_empty() {
            stem = format!("record_{}", record.id);
        }

        let bytes = self.fetcher.fetch_bytes(&url).await?;
        let path = dir.join(format!("{stem}{ext}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(Some(path))
    }

    pub async fn download_all(&self, records: &[PenaltyRecord], dir: &Path) -> Result<DownloadReport> {
        tokio::fs::create_dir_all(dir).await?;
        let mut report = DownloadReport::default();

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if record.download_url.is_empty() {
                warn!("Skipping {}: no URL", record.document_title);
                report.failed += 1;
                continue;
            }

            match self.download_record(record, dir).await {
                Ok(Some(path)) => {
                    info!("Saved {}", path.display());
                    report.saved += 1;
                }
                Ok(None) => {
                    warn!("No document linked from {}", record.download_url);
                    report.missing += 1;
                }
                Err(e) => {
                    warn!("Failed to download {}: {}", record.document_title, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
