pub mod sqlite;

use crate::app::Result;
use crate::domain::{EnrichedRecord, LicenseKind, LicenseRecord, NoticeRow, PenaltyRecord, SaveReport};

pub use sqlite::SqliteStore;

pub trait Store: Send + Sync {
    // Penalty operations
    fn save_penalties(&self, records: &[EnrichedRecord]) -> Result<SaveReport>;
    fn penalties(&self, province: Option<&str>) -> Result<Vec<PenaltyRecord>>;
    fn province_counts(&self) -> Result<Vec<(String, i64)>>;

    // License operations
    fn replace_licenses(&self, kind: LicenseKind, records: &[LicenseRecord]) -> Result<usize>;
    fn licenses(&self, kind: LicenseKind) -> Result<Vec<LicenseRecord>>;
    fn replace_notices(&self, rows: &[NoticeRow]) -> Result<usize>;
    fn notices(&self) -> Result<Vec<NoticeRow>>;
}
