use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Record type stored alongside every penalty row.
pub const RECORD_TYPE_PENALTY: &str = "行政处罚";

/// One list item or table row pulled off a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub province: String,
    pub branch: String,
    pub title: String,
    /// Absolute detail link; the dedup key.
    pub url: String,
    /// Free text as published, empty when the page shows none.
    pub date: String,
}

impl RawEntry {
    pub fn new(
        province: impl Into<String>,
        branch: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            province: province.into(),
            branch: branch.into(),
            title: title.into(),
            url: url.into(),
            date: date.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub entry: RawEntry,
    pub attachments: Vec<Attachment>,
}

impl EnrichedRecord {
    pub fn new(entry: RawEntry) -> Self {
        Self {
            entry,
            attachments: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.entry.url
    }

    pub fn date(&self) -> &str {
        &self.entry.date
    }

    pub fn province(&self) -> &str {
        &self.entry.province
    }
}

impl std::fmt::Display for EnrichedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.entry.url)
    }
}

impl From<RawEntry> for EnrichedRecord {
    fn from(entry: RawEntry) -> Self {
        Self::new(entry)
    }
}

/// A penalty row as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub id: i64,
    pub province: String,
    pub branch: String,
    pub document_title: String,
    pub publish_date: Option<NaiveDate>,
    pub download_url: String,
    pub last_seen_at: DateTime<Utc>,
    pub record_type: String,
}

impl PenaltyRecord {
    pub fn display_date(&self) -> String {
        self.publish_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string())
    }
}

/// Counts returned by a persistence batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub inserted: usize,
    pub touched: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_record_serializes_flat() {
        let mut record = EnrichedRecord::new(RawEntry::new(
            "海南省",
            "海南省分行",
            "罚单A",
            "https://example.com/a.html",
            "2024-05-01",
        ));
        record.attachments.push(Attachment {
            name: "决定书".into(),
            url: "https://example.com/a.pdf".into(),
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["province"], "海南省");
        assert_eq!(json["url"], "https://example.com/a.html");
        assert_eq!(json["attachments"][0]["name"], "决定书");
    }
}
