//! Canonicalization applied between parsing and persistence.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{EnrichedRecord, RawEntry};

static CHINESE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})年(\d{1,2})月(\d{1,2})日").expect("valid regex"));

/// `2025年7月2日` becomes `2025-07-02`. Anything else is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    match CHINESE_DATE.captures(raw) {
        Some(caps) => {
            let month: u32 = caps[2].parse().unwrap_or_default();
            let day: u32 = caps[3].parse().unwrap_or_default();
            format!("{}-{:02}-{:02}", &caps[1], month, day)
        }
        None => raw.to_string(),
    }
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// One record per distinct url, keeping the first seen.
pub fn deduplicate(entries: Vec<RawEntry>) -> Vec<RawEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| !e.url.is_empty() && seen.insert(e.url.clone()))
        .collect()
}

pub fn normalize_entries(entries: &mut [RawEntry]) {
    for entry in entries {
        entry.title = entry.title.trim().to_string();
        entry.date = normalize_date(entry.date.trim());
    }
}

/// Newest first; records without a parseable date go last, in their original order.
pub fn sort_by_date_desc(records: &mut [EnrichedRecord]) {
    records.sort_by(|a, b| parse_date(b.date()).cmp(&parse_date(a.date())));
}

/// Branch label for a standard-template portlet, from its heading text.
pub fn branch_label(portlet_title: &str, province: &str) -> String {
    if portlet_title.contains("辖内") || portlet_title.contains("分支机构") {
        "辖内分支机构".to_string()
    } else {
        format!("{province}分行")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Year,
    Month,
}

impl DateRange {
    /// Earliest date kept, or `None` for no bound.
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateRange::All => None,
            DateRange::Year => Some(today - Duration::days(365)),
            DateRange::Month => Some(today - Duration::days(30)),
        }
    }

    /// Undated records are only kept by `All`.
    pub fn contains(self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        match self.start(today) {
            None => true,
            Some(start) => date.is_some_and(|d| d >= start),
        }
    }
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DateRange::All),
            "year" => Ok(DateRange::Year),
            "month" => Ok(DateRange::Month),
            other => Err(format!("Invalid range: {other}. Use all, year or month")),
        }
    }
}

/// Company names the monitoring desk watches for in penalty titles.
pub const WATCHED_KEYWORDS: &[&str] = &["支付宝", "财付通", "拉卡拉", "快钱", "新生", "钱宝"];

/// Watched keywords that occur in at least one of `titles`.
pub fn keywords_present<'a>(titles: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
    let titles: Vec<&str> = titles.into_iter().collect();
    WATCHED_KEYWORDS
        .iter()
        .copied()
        .filter(|k| titles.iter().any(|t| t.contains(k)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, title: &str, date: &str) -> RawEntry {
        RawEntry::new("海南省", "海南省分行", title, url, date)
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2025年7月2日"), "2025-07-02");
        assert_eq!(normalize_date("2025年12月31日"), "2025-12-31");
        assert_eq!(normalize_date("2025-07-02"), "2025-07-02");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("长期有效"), "长期有效");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-01"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024年1月1日"), None);
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let entries = vec![
            entry("https://a/1.html", "first", "2024-01-01"),
            entry("https://a/2.html", "other", ""),
            entry("https://a/1.html", "second", "2024-02-02"),
        ];
        let deduped = deduplicate(entries);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
        assert_eq!(deduped[0].date, "2024-01-01");
    }

    #[test]
    fn test_deduplicate_drops_empty_urls() {
        let deduped = deduplicate(vec![entry("", "x", ""), entry("", "y", "")]);
        assert!(deduped.is_empty());
    }

    #[test]
    fn test_sort_by_date_desc_puts_unparseable_last() {
        let mut records: Vec<EnrichedRecord> = ["2024-01-01", "2025-06-01", ""]
            .iter()
            .enumerate()
            .map(|(i, d)| entry(&format!("https://a/{i}.html"), "t", d).into())
            .collect();
        sort_by_date_desc(&mut records);
        let dates: Vec<&str> = records.iter().map(|r| r.date()).collect();
        assert_eq!(dates, vec!["2025-06-01", "2024-01-01", ""]);
    }

    #[test]
    fn test_normalize_entries() {
        let mut entries = vec![entry("https://a/1.html", "  罚单 ", " 2024年5月1日 ")];
        normalize_entries(&mut entries);
        assert_eq!(entries[0].title, "罚单");
        assert_eq!(entries[0].date, "2024-05-01");
    }

    #[test]
    fn test_branch_label() {
        assert_eq!(branch_label("海南省分行行政处罚", "海南省"), "海南省分行");
        assert_eq!(branch_label("辖内分支机构行政处罚", "海南省"), "辖内分支机构");
        assert_eq!(branch_label("", "海南省"), "海南省分行");
    }

    #[test]
    fn test_date_range() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let recent = NaiveDate::from_ymd_opt(2025, 6, 20);
        let old = NaiveDate::from_ymd_opt(2024, 1, 1);

        assert!(DateRange::All.contains(None, today));
        assert!(DateRange::Month.contains(recent, today));
        assert!(!DateRange::Month.contains(old, today));
        assert!(!DateRange::Year.contains(None, today));
        assert_eq!("YEAR".parse::<DateRange>(), Ok(DateRange::Year));
        assert!("week".parse::<DateRange>().is_err());
    }

    #[test]
    fn test_keywords_present() {
        let found = keywords_present(["关于支付宝的处罚", "拉卡拉处罚决定"]);
        assert_eq!(found, vec!["支付宝", "拉卡拉"]);
    }
}
