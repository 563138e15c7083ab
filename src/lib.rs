//! # Regwatch
//!
//! Collects regulatory disclosures published across the People's Bank of
//! China branch websites: administrative penalties, payment-institution
//! licenses and licence-change notices.
//!
//! ## Architecture
//!
//! ```text
//! Crawler → Pagination → Fetcher → Parser → Normalizer → Extractor → Store
//! ```
//!
//! - [`pagination`]: works out the listing pages of each site
//! - [`parser`]: pulls entries out of a listing page, per site template
//! - [`extractor`]: detail-page fields, attachments, registry lists
//! - [`store`]: SQLite persistence layer
//!
//! ## Quick Start
//!
//! ```bash
//! # Crawl two provinces and store what was found
//! regwatch penalties -p 海南省 -p 北京市
//!
//! # Stored penalties from the last month
//! regwatch list --range month
//!
//! # License registries and licence-change notices
//! regwatch licenses
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetchers, crawlers.
pub mod app;

/// Command-line interface using clap.
///
/// - `penalties [-p <province>]... [--max-pages N] [--json] [--progress]`
/// - `licenses`
/// - `list [-p <province>] [--range all|year|month] [--keyword K]`
/// - `sites`
/// - `download -p <province> [--dir D]`
pub mod cli;

/// Configuration loaded from `~/.config/regwatch/config.toml`.
pub mod config;

/// Concurrent crawl flows on a bounded worker pool.
///
/// - [`WorkerPool`](crawler::WorkerPool): semaphore-bounded `JoinSet` with cancellation
/// - [`PenaltyCrawler`](crawler::PenaltyCrawler): listings, dedup, attachments
/// - [`LicenseCrawler`](crawler::LicenseCrawler): registries and licence-change notice
/// - [`CrawlSession`](crawler::CrawlSession): background crawl with pollable progress
pub mod crawler;

/// Core domain models.
///
/// - [`SiteDescriptor`](domain::SiteDescriptor): a monitored site and its template
/// - [`RawEntry`](domain::RawEntry) / [`EnrichedRecord`](domain::EnrichedRecord): crawled penalties
/// - [`LicenseRecord`](domain::LicenseRecord), [`NoticeRow`](domain::NoticeRow): registry data
/// - [`ProgressHandle`](domain::ProgressHandle): shared crawl progress
pub mod domain;

/// Document download for stored penalties.
pub mod download;

/// Detail-page and registry extraction.
pub mod extractor;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async page transport trait
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Date normalization, deduplication, ordering and filters.
pub mod normalizer;

/// Listing-page pagination.
pub mod pagination;

/// Listing-page parsers for the standard and special templates.
pub mod parser;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
