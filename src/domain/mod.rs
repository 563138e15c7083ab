pub mod license;
pub mod progress;
pub mod record;
pub mod site;

pub use license::{FieldMap, LicenseField, LicenseKind, LicenseListing, LicenseRecord, NoticeRow};
pub use progress::{CrawlStatus, Progress, ProgressHandle};
pub use record::{Attachment, EnrichedRecord, PenaltyRecord, RawEntry, SaveReport, RECORD_TYPE_PENALTY};
pub use site::{builtin_sites, select_sites, Dialect, SiteDescriptor};
