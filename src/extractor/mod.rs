//! Extraction from pages reached through a listing: penalty and license
//! detail pages, registry list pages and the licence-change notice.

pub mod attachments;
pub mod fields;
pub mod listing;
pub mod notice;

pub use attachments::collect_attachments;
pub use fields::{extract_fields, extract_fields_from, FieldRule, FIELD_RULES};
pub use listing::{parse_listing, total_pages};
pub use notice::{find_link_by_keyword, parse_notice_table};
