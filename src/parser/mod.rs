//! Listing-page parsers, one per site dialect.

pub(crate) mod dom;
mod special;
mod standard;

use scraper::Html;

use crate::domain::{Dialect, RawEntry, SiteDescriptor};

pub use dom::normalize_href;
pub use special::SpecialParser;
pub use standard::StandardParser;

/// Pulls raw entries out of one parsed listing page.
pub trait PageParser: Send + Sync {
    fn parse(&self, document: &Html, page_url: &str, province: &str) -> Vec<RawEntry>;
}

pub fn parser_for(dialect: Dialect) -> &'static dyn PageParser {
    match dialect {
        Dialect::Standard => &StandardParser,
        Dialect::Special => &SpecialParser,
    }
}

/// Parse a fetched listing page with the parser for the site's dialect.
pub fn parse_page_items(html: &str, page_url: &str, site: &SiteDescriptor) -> Vec<RawEntry> {
    let document = Html::parse_document(html);
    parser_for(site.dialect).parse(&document, page_url, &site.province)
}
